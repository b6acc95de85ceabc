//! Thin façade over intra-process (Rayon) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees).
//! Every handle is waitable; collectives call `.wait()` before trusting a
//! buffer. A communicator value carries the rank and group size, and is
//! passed by reference into every component that needs them.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::{Arc, Barrier};

/// Typed message tag. Each collective call site uses its own tag so that
/// message streams between the same pair of ranks never interleave.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CommTag(pub u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        CommTag(tag)
    }

    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Derive a sub-tag, e.g. one per phase of a multi-step exchange.
    pub const fn offset(self, by: u16) -> Self {
        CommTag(self.0.wrapping_add(by))
    }
}

/// Tags used by the library's collectives.
pub mod tags {
    use super::CommTag;

    pub const DATASET_META: CommTag = CommTag::new(0x0100);
    pub const DATASET_SCATTER: CommTag = CommTag::new(0x0110);
    pub const BATCH_ROUTE: CommTag = CommTag::new(0x0200);
    pub const QUERY_REDUCE: CommTag = CommTag::new(0x0300);
    pub const QUERY_TOP_N: CommTag = CommTag::new(0x0310);
    pub const SEED_DEGREE: CommTag = CommTag::new(0x0400);
    pub const BFS: CommTag = CommTag::new(0x0500);
    pub const SSSP: CommTag = CommTag::new(0x0520);
    pub const CC: CommTag = CommTag::new(0x0540);
    pub const PAGERANK: CommTag = CommTag::new(0x0560);
    pub const BC: CommTag = CommTag::new(0x0580);
    pub const SNAPSHOT: CommTag = CommTag::new(0x05a0);
}

/// Non-blocking communication interface (minimal by design).
pub trait Communicator {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    /// Post a receive for exactly `buf.len()` bytes. The data is returned by
    /// [`Wait::wait`]; longer messages are truncated to `buf.len()`.
    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle;

    /// This process's rank in the group.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;
    /// Block until every rank has called `barrier`.
    fn barrier(&self);

    /// Rank 0 reads input, reports configuration errors and roots the
    /// construction-time scatters.
    fn is_coordinator(&self) -> bool {
        self.rank() == 0
    }
}

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

/// Compile-time no-op comm for pure serial runs: one rank, no peers.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16, _buf: &mut [u8]) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}
}

// --- RayonComm: intra-process / one thread per rank ---
type Key = (usize, usize, u16); // (src, dst, tag)

/// Mailbox shared by every member of one in-process group.
struct Mailbox {
    slots: DashMap<Key, VecDeque<Bytes>>,
    lock: Mutex<()>,
    arrived: Condvar,
    barrier: Barrier,
}

impl Mailbox {
    fn new(size: usize) -> Self {
        Self {
            slots: DashMap::new(),
            lock: Mutex::new(()),
            arrived: Condvar::new(),
            barrier: Barrier::new(size),
        }
    }

    fn post(&self, key: Key, data: Bytes) {
        self.slots.entry(key).or_default().push_back(data);
        let _guard = self.lock.lock();
        self.arrived.notify_all();
    }

    fn try_take(&self, key: &Key) -> Option<Bytes> {
        self.slots.get_mut(key).and_then(|mut q| q.pop_front())
    }

    fn take(&self, key: &Key) -> Bytes {
        loop {
            if let Some(data) = self.try_take(key) {
                return data;
            }
            let mut guard = self.lock.lock();
            // re-check under the lock: a sender always notifies while holding it
            if let Some(data) = self.try_take(key) {
                return data;
            }
            self.arrived.wait(&mut guard);
        }
    }
}

/// Receive handle for [`RayonComm`]; blocks in `wait` until the message is posted.
pub struct LocalHandle {
    mailbox: Arc<Mailbox>,
    key: Key,
    len: usize,
}

impl Wait for LocalHandle {
    fn wait(self) -> Option<Vec<u8>> {
        let bytes = self.mailbox.take(&self.key);
        let n = self.len.min(bytes.len());
        Some(bytes[..n].to_vec())
    }
}

/// In-process communicator: every rank of a group runs on its own thread and
/// messages travel through a shared FIFO mailbox per `(src, dst, tag)`.
#[derive(Clone)]
pub struct RayonComm {
    rank: usize,
    size: usize,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for RayonComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl RayonComm {
    /// Build the `size` members of a fresh group, ordered by rank.
    pub fn group(size: usize) -> Vec<RayonComm> {
        let size = size.max(1);
        let mailbox = Arc::new(Mailbox::new(size));
        (0..size)
            .map(|rank| RayonComm {
                rank,
                size,
                mailbox: mailbox.clone(),
            })
            .collect()
    }

    /// Run `f` once per rank of a fresh `size`-rank group, each on its own
    /// thread, and return the results in rank order.
    ///
    /// Collectives block until all ranks participate, so every rank needs a
    /// dedicated thread; a bounded pool could starve the group.
    pub fn run<F, R>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(RayonComm) -> R + Sync,
        R: Send,
    {
        let comms = Self::group(size);
        std::thread::scope(|s| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    s.spawn(move || f(comm))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(r) => r,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }
}

impl Communicator for RayonComm {
    type SendHandle = ();
    type RecvHandle = LocalHandle;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle {
        self.mailbox
            .post((self.rank, peer, tag), Bytes::copy_from_slice(buf));
    }

    fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> Self::RecvHandle {
        LocalHandle {
            mailbox: self.mailbox.clone(),
            key: (peer, self.rank, tag),
            len: buf.len(),
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) {
        self.mailbox.barrier.wait();
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use crate::graph_error::DynoGraphError;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI communicator over `MPI_COMM_WORLD`.
    ///
    /// Point-to-point calls are blocking under the hood; the library's
    /// collectives are all rooted (root sends, peers receive, or the
    /// reverse), so no pair of ranks ever sends to each other at once.
    pub struct MpiComm {
        world: SimpleCommunicator,
        rank: usize,
        size: usize,
        // dropped last: finalizes MPI
        _universe: Universe,
    }

    impl MpiComm {
        pub fn new() -> Result<Self, DynoGraphError> {
            let universe = mpi::initialize().ok_or_else(|| DynoGraphError::CommError {
                neighbor: 0,
                source: "MPI already initialized or unavailable".into(),
            })?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// Completed receive; MPI calls finish before the handle is returned.
    pub struct MpiHandle(Option<Vec<u8>>);

    impl Wait for MpiHandle {
        fn wait(self) -> Option<Vec<u8>> {
            self.0
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = ();
        type RecvHandle = MpiHandle;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
            self.world
                .process_at_rank(peer as i32)
                .send_with_tag(buf, tag as i32);
        }

        fn irecv(&self, peer: usize, tag: u16, buf: &mut [u8]) -> MpiHandle {
            let (mut data, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(tag as i32);
            data.truncate(buf.len());
            buf[..data.len()].copy_from_slice(&data);
            MpiHandle(Some(data))
        }

        fn rank(&self) -> usize {
            self.rank
        }

        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rayon_roundtrip_two_ranks() {
        let comms = RayonComm::group(2);
        let (comm0, comm1) = (&comms[0], &comms[1]);

        let mut recv_buf = [0u8; 4];
        let recv_handle = comm1.irecv(0, 7, &mut recv_buf);
        let send_handle = comm0.isend(1, 7, &[1, 2, 3, 4]);
        send_handle.wait();

        let data = recv_handle
            .wait()
            .expect("Expected to receive data from rank 0");
        recv_buf.copy_from_slice(&data);
        assert_eq!(&recv_buf, &[1, 2, 3, 4]);
    }

    #[test]
    fn groups_do_not_share_mailboxes() {
        let a = RayonComm::group(2);
        let b = RayonComm::group(2);
        a[0].isend(1, 3, &[9]);
        b[0].isend(1, 3, &[5]);
        let mut buf = [0u8; 1];
        assert_eq!(b[1].irecv(0, 3, &mut buf).wait().unwrap(), vec![5]);
        assert_eq!(a[1].irecv(0, 3, &mut buf).wait().unwrap(), vec![9]);
    }

    #[test]
    fn run_returns_in_rank_order() {
        let ranks = RayonComm::run(4, |comm| {
            comm.barrier();
            (comm.rank(), comm.size())
        });
        assert_eq!(ranks, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }

    #[test]
    fn no_comm_is_single_rank() {
        assert_eq!(NoComm.rank(), 0);
        assert_eq!(NoComm.size(), 1);
        assert!(NoComm.is_coordinator());
        assert!(NoComm.irecv(0, 1, &mut []).wait().is_none());
    }
}
