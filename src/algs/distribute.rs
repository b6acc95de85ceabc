// src/algs/distribute.rs

//! Route batch updates to the rank that owns each edge's source vertex.
//!
//! The rooted form [`distribute_batch`] is the primitive: one rank holds the
//! updates, sorts them by owner, and ships each peer its contiguous run
//! (count first, then the records). [`exchange_batch`] is what ingestion
//! uses once every rank holds a slice of the batch: it runs the rooted form
//! once per rank, in rank order. Validation failures are agreed on
//! cluster-wide before any update moves, so a bad id never strands a peer
//! waiting for its run.

use crate::algs::collective::{min, recv_vec, send_vec};
use crate::algs::communicator::{CommTag, Communicator, tags};
use crate::algs::partition::Partition;
use crate::algs::wire::WireEdge;
use crate::graph_error::DynoGraphError;
use crate::topology::edge::EdgeUpdate;

/// Updates sorted by owning rank, with the run length for every rank.
#[derive(Debug, Default)]
pub struct OwnerRuns {
    pub updates: Vec<EdgeUpdate>,
    pub counts: Vec<usize>,
}

impl OwnerRuns {
    /// The contiguous run destined for `rank`.
    pub fn run(&self, rank: usize) -> &[EdgeUpdate] {
        let start: usize = self.counts[..rank].iter().sum();
        &self.updates[start..start + self.counts[rank]]
    }
}

/// Sort `updates` by `owner(src)` and count the run for every rank in one scan.
///
/// Every endpoint is validated against `max_vertex_id` first; a bad id
/// aborts the whole batch.
pub fn split_by_owner(
    partition: &Partition,
    max_vertex_id: u64,
    mut updates: Vec<EdgeUpdate>,
) -> Result<OwnerRuns, DynoGraphError> {
    let n_parts = partition.n_parts();
    for u in &updates {
        partition.try_owner(u.src, max_vertex_id)?;
        partition.try_owner(u.dst, max_vertex_id)?;
    }
    updates.sort_by_key(|u| partition.owner(u.src));

    let mut counts = vec![0usize; n_parts];
    for u in &updates {
        counts[partition.owner(u.src)] += 1;
    }
    Ok(OwnerRuns { updates, counts })
}

/// Scatter the root's `updates` so each rank ends with exactly the updates
/// whose source it owns. Non-root input must be empty and is ignored.
///
/// The root validates the batch before anything is sent; a rejected batch
/// fails on every rank.
pub fn distribute_batch<C>(
    comm: &C,
    partition: &Partition,
    max_vertex_id: u64,
    root: usize,
    updates: Vec<EdgeUpdate>,
) -> Result<Vec<EdgeUpdate>, DynoGraphError>
where
    C: Communicator,
{
    check_layout(comm, partition)?;
    let local = if comm.rank() == root {
        split_by_owner(partition, max_vertex_id, updates).map(Some)
    } else {
        if !updates.is_empty() {
            log::warn!(
                "rank {} passed {} updates to a batch rooted at {}; ignoring them",
                comm.rank(),
                updates.len(),
                root
            );
        }
        Ok(None)
    };
    let runs = agree_valid(comm, tags::BATCH_ROUTE.offset(2), local)?;
    route(comm, root, runs, tags::BATCH_ROUTE)
}

/// All-to-all routing: every rank contributes `local_slice` and receives the
/// updates it owns from every rank, in rank order of the sender.
///
/// Every slice is validated up front; if any rank rejects its slice, no
/// updates move and every rank returns an error.
pub fn exchange_batch<C>(
    comm: &C,
    partition: &Partition,
    max_vertex_id: u64,
    local_slice: Vec<EdgeUpdate>,
) -> Result<Vec<EdgeUpdate>, DynoGraphError>
where
    C: Communicator,
{
    check_layout(comm, partition)?;
    let tag = tags::BATCH_ROUTE.offset(4);
    let local = split_by_owner(partition, max_vertex_id, local_slice);
    let mut runs = Some(agree_valid(comm, tag.offset(2), local)?);
    let mut mine = Vec::new();
    for root in 0..comm.size() {
        let contribution = if root == comm.rank() { runs.take() } else { None };
        mine.extend(route(comm, root, contribution, tag)?);
    }
    Ok(mine)
}

fn check_layout<C: Communicator>(comm: &C, partition: &Partition) -> Result<(), DynoGraphError> {
    if partition.n_parts() != comm.size() {
        return Err(DynoGraphError::CollectiveLayout(format!(
            "partition has {} parts but the group has {} ranks",
            partition.n_parts(),
            comm.size()
        )));
    }
    Ok(())
}

/// Collective verdict on per-rank validation. A failing rank keeps its own
/// error; the others report the lowest failing rank.
fn agree_valid<C, T>(
    comm: &C,
    tag: CommTag,
    local: Result<T, DynoGraphError>,
) -> Result<T, DynoGraphError>
where
    C: Communicator,
{
    // rank + 1 of a failing rank, u64::MAX when this rank is fine
    let flag = match local {
        Ok(_) => u64::MAX,
        Err(_) => comm.rank() as u64 + 1,
    };
    let first_failed = min(comm, tag, flag)?;
    match local {
        Err(e) => Err(e),
        Ok(_) if first_failed != u64::MAX => Err(DynoGraphError::PeerRejected {
            rank: (first_failed - 1) as usize,
        }),
        Ok(v) => Ok(v),
    }
}

/// Ship the root's runs to their owners. Only the root passes `Some`.
fn route<C>(
    comm: &C,
    root: usize,
    runs: Option<OwnerRuns>,
    tag: CommTag,
) -> Result<Vec<EdgeUpdate>, DynoGraphError>
where
    C: Communicator,
{
    if comm.rank() != root {
        let wire: Vec<WireEdge> = recv_vec(comm, root, tag)?;
        return Ok(wire.into_iter().map(EdgeUpdate::from).collect());
    }
    let runs = runs.unwrap_or_else(|| OwnerRuns {
        updates: Vec::new(),
        counts: vec![0; comm.size()],
    });
    for peer in (0..comm.size()).filter(|&p| p != root) {
        let wire: Vec<WireEdge> = runs.run(peer).iter().map(WireEdge::from).collect();
        send_vec(comm, peer, tag, &wire);
    }
    log::debug!(
        "rank {root} routed batch: per-rank counts {:?}",
        runs.counts
    );
    Ok(runs.run(root).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};

    fn batch() -> Vec<EdgeUpdate> {
        vec![
            EdgeUpdate::new(1, 2, 5, 100),
            EdgeUpdate::new(1, 2, 3, 90),
            EdgeUpdate::new(3, 4, 1, 50),
            EdgeUpdate::new(2, 5, 1, 10),
        ]
    }

    #[test]
    fn split_counts_runs() {
        let p = Partition::cyclic(2);
        let runs = split_by_owner(&p, 10, batch()).unwrap();
        assert_eq!(runs.counts, vec![1, 3]);
        assert!(runs.run(1).iter().all(|u| u.src.get() % 2 == 1));
        assert_eq!(runs.run(0)[0].src.get(), 2);
    }

    #[test]
    fn split_rejects_out_of_range() {
        let p = Partition::cyclic(2);
        let bad = vec![EdgeUpdate::new(1, 10, 1, 1)];
        assert!(matches!(
            split_by_owner(&p, 10, bad),
            Err(DynoGraphError::VertexOutOfRange { .. })
        ));
    }

    #[test]
    fn single_rank_keeps_everything() {
        let p = Partition::cyclic(1);
        let got = distribute_batch(&NoComm, &p, 10, 0, batch()).unwrap();
        assert_eq!(got.len(), 4);
    }

    #[test]
    fn partition_must_match_group() {
        let p = Partition::cyclic(2);
        assert!(matches!(
            distribute_batch(&NoComm, &p, 10, 0, batch()),
            Err(DynoGraphError::CollectiveLayout(_))
        ));
    }

    #[test]
    fn two_rank_distribution() {
        let out = RayonComm::run(2, |comm| {
            let p = Partition::cyclic(2);
            let input = if comm.rank() == 0 { batch() } else { Vec::new() };
            distribute_batch(&comm, &p, 10, 0, input).unwrap()
        });
        assert_eq!(out[0].len(), 1);
        assert_eq!(out[1].len(), 3);
        assert!(out[1].iter().all(|u| u.src.get() % 2 == 1));
    }

    #[test]
    fn rejected_batch_fails_on_every_rank() {
        let out = RayonComm::run(2, |comm| {
            let p = Partition::cyclic(2);
            let input = if comm.rank() == 0 {
                vec![EdgeUpdate::new(1, 2, 1, 1), EdgeUpdate::new(11, 2, 1, 1)]
            } else {
                Vec::new()
            };
            distribute_batch(&comm, &p, 10, 0, input)
        });
        assert!(matches!(out[0], Err(DynoGraphError::VertexOutOfRange { .. })));
        assert!(matches!(out[1], Err(DynoGraphError::PeerRejected { rank: 0 })));
    }
}
