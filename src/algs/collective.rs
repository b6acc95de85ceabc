//! Collective operations built on the point-to-point [`Communicator`] API.
//!
//! Every collective is rooted: either the root sends and the peers receive
//! (broadcast, scatter) or the peers send and the root receives (gather).
//! Reductions are a gather followed by a broadcast. No two ranks ever send
//! to each other at the same time, so the pattern is safe with blocking
//! sends. Variable-length payloads travel as a [`WireCount`] message followed
//! by the records on the same tag; empty payloads send only the count.
//!
//! All ranks must call the same collectives in the same order with the same
//! tags; a rank that skips one stalls the group.

use crate::algs::communicator::{CommTag, Communicator, Wait};
use crate::algs::wire::{WireCount, cast_slice, cast_slice_mut};
use crate::graph_error::DynoGraphError;
use bytemuck::Pod;
use num_traits::{Bounded, Zero};
use std::ops::Add;

/// Send `data` to `peer` as count + payload.
pub fn send_vec<C, T>(comm: &C, peer: usize, tag: CommTag, data: &[T])
where
    C: Communicator,
    T: Pod,
{
    let count = WireCount::new(data.len());
    let _ = comm
        .isend(peer, tag.as_u16(), cast_slice(std::slice::from_ref(&count)))
        .wait();
    if !data.is_empty() {
        let _ = comm.isend(peer, tag.as_u16(), cast_slice(data)).wait();
    }
}

/// Receive a count + payload message sent with [`send_vec`].
pub fn recv_vec<C, T>(comm: &C, peer: usize, tag: CommTag) -> Result<Vec<T>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    let mut cnt = WireCount::new(0);
    let raw = comm
        .irecv(
            peer,
            tag.as_u16(),
            cast_slice_mut(std::slice::from_mut(&mut cnt)),
        )
        .wait()
        .ok_or_else(|| DynoGraphError::CommError {
            neighbor: peer,
            source: format!("failed to receive size from rank {peer}").into(),
        })?;
    if raw.len() != std::mem::size_of::<WireCount>() {
        return Err(DynoGraphError::BufferSizeMismatch {
            neighbor: peer,
            expected: std::mem::size_of::<WireCount>(),
            got: raw.len(),
        });
    }
    cast_slice_mut(std::slice::from_mut(&mut cnt)).copy_from_slice(&raw);

    let n = cnt.get().ok_or_else(|| DynoGraphError::CommError {
        neighbor: peer,
        source: format!("record count from rank {peer} does not fit in memory").into(),
    })?;
    let expected = n
        .checked_mul(std::mem::size_of::<T>())
        .ok_or_else(|| DynoGraphError::CommError {
            neighbor: peer,
            source: format!("payload of {n} records from rank {peer} overflows").into(),
        })?;
    let mut out = vec![T::zeroed(); n];
    if n == 0 {
        return Ok(out);
    }
    let raw = comm
        .irecv(peer, tag.as_u16(), cast_slice_mut(&mut out))
        .wait()
        .ok_or_else(|| DynoGraphError::CommError {
            neighbor: peer,
            source: "No data received (wait returned None)".into(),
        })?;
    if raw.len() != expected {
        return Err(DynoGraphError::BufferSizeMismatch {
            neighbor: peer,
            expected,
            got: raw.len(),
        });
    }
    cast_slice_mut(&mut out).copy_from_slice(&raw);
    Ok(out)
}

/// Broadcast the root's `data` to every rank. Non-root input is ignored.
pub fn broadcast_vec<C, T>(
    comm: &C,
    tag: CommTag,
    root: usize,
    data: Vec<T>,
) -> Result<Vec<T>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    if comm.rank() == root {
        for peer in (0..comm.size()).filter(|&p| p != root) {
            send_vec(comm, peer, tag, &data);
        }
        Ok(data)
    } else {
        recv_vec(comm, root, tag)
    }
}

/// Broadcast a single value from `root`.
pub fn broadcast_scalar<C, T>(
    comm: &C,
    tag: CommTag,
    root: usize,
    value: T,
) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    let v = broadcast_vec(comm, tag, root, vec![value])?;
    match v.as_slice() {
        [x] => Ok(*x),
        other => Err(DynoGraphError::BufferSizeMismatch {
            neighbor: root,
            expected: std::mem::size_of::<T>(),
            got: std::mem::size_of_val(other),
        }),
    }
}

/// Root hands `pieces[r]` to rank `r` and keeps its own piece.
/// On the root, `pieces.len()` must equal `comm.size()`; elsewhere it is ignored.
pub fn scatter_vec<C, T>(
    comm: &C,
    tag: CommTag,
    root: usize,
    pieces: Vec<Vec<T>>,
) -> Result<Vec<T>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    if comm.rank() != root {
        return recv_vec(comm, root, tag);
    }
    if pieces.len() != comm.size() {
        return Err(DynoGraphError::CollectiveLayout(format!(
            "scatter needs {} pieces, got {}",
            comm.size(),
            pieces.len()
        )));
    }
    let mut mine = Vec::new();
    for (peer, piece) in pieces.into_iter().enumerate() {
        if peer == root {
            mine = piece;
        } else {
            send_vec(comm, peer, tag, &piece);
        }
    }
    Ok(mine)
}

/// Collect every rank's `local` at `root`, in rank order. Non-roots get `None`.
pub fn gather_vec<C, T>(
    comm: &C,
    tag: CommTag,
    root: usize,
    local: Vec<T>,
) -> Result<Option<Vec<Vec<T>>>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    if comm.rank() != root {
        send_vec(comm, root, tag, &local);
        return Ok(None);
    }
    let mut local = Some(local);
    let mut all = Vec::with_capacity(comm.size());
    for peer in 0..comm.size() {
        if peer == root {
            all.push(local.take().unwrap_or_default());
        } else {
            all.push(recv_vec(comm, peer, tag)?);
        }
    }
    Ok(Some(all))
}

/// Every rank receives every rank's `local`, in rank order.
pub fn allgather_vec<C, T>(
    comm: &C,
    tag: CommTag,
    local: Vec<T>,
) -> Result<Vec<Vec<T>>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
{
    const ROOT: usize = 0;
    let gathered = gather_vec(comm, tag, ROOT, local)?;
    let (counts, flat): (Vec<u64>, Vec<T>) = match gathered {
        Some(parts) => (
            parts.iter().map(|p| p.len() as u64).collect(),
            parts.into_iter().flatten().collect(),
        ),
        None => (Vec::new(), Vec::new()),
    };
    let counts = broadcast_vec(comm, tag.offset(1), ROOT, counts)?;
    let mut flat = broadcast_vec(comm, tag.offset(2), ROOT, flat)?;
    let total: u64 = counts.iter().sum();
    if total as usize != flat.len() {
        return Err(DynoGraphError::CollectiveLayout(format!(
            "allgather counts sum to {total} but {} records arrived",
            flat.len()
        )));
    }
    let mut out = Vec::with_capacity(counts.len());
    for &c in counts.iter().rev() {
        let tail = flat.split_off(flat.len() - c as usize);
        out.push(tail);
    }
    out.reverse();
    Ok(out)
}

/// Reduce one value per rank with `op` (applied in rank order) and give
/// every rank the result.
pub fn allreduce<C, T, F>(comm: &C, tag: CommTag, value: T, op: F) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod,
    F: Fn(T, T) -> T,
{
    fold_reduce(comm, tag, value, None, op)
}

fn fold_reduce<C, T, F>(
    comm: &C,
    tag: CommTag,
    value: T,
    identity: Option<T>,
    op: F,
) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod,
    F: Fn(T, T) -> T,
{
    const ROOT: usize = 0;
    let reduced = match gather_vec(comm, tag, ROOT, vec![value])? {
        Some(parts) => {
            let values = parts.into_iter().flatten();
            match identity {
                Some(init) => values.fold(init, &op),
                None => values.reduce(&op).unwrap_or(value),
            }
        }
        None => value,
    };
    broadcast_scalar(comm, tag.offset(1), ROOT, reduced)
}

/// Element-wise reduction of equally long per-rank vectors.
pub fn allreduce_vec<C, T, F>(
    comm: &C,
    tag: CommTag,
    local: Vec<T>,
    op: F,
) -> Result<Vec<T>, DynoGraphError>
where
    C: Communicator,
    T: Pod,
    F: Fn(T, T) -> T,
{
    const ROOT: usize = 0;
    let reduced = match gather_vec(comm, tag, ROOT, local)? {
        Some(parts) => {
            let mut iter = parts.into_iter();
            let mut acc = iter.next().unwrap_or_default();
            for (peer, part) in iter.enumerate() {
                if part.len() != acc.len() {
                    return Err(DynoGraphError::CollectiveLayout(format!(
                        "rank {} contributed {} elements, expected {}",
                        peer + 1,
                        part.len(),
                        acc.len()
                    )));
                }
                for (a, b) in acc.iter_mut().zip(part) {
                    *a = op(*a, b);
                }
            }
            acc
        }
        None => Vec::new(),
    };
    broadcast_vec(comm, tag.offset(1), ROOT, reduced)
}

/// Cluster-wide sum.
pub fn sum<C, T>(comm: &C, tag: CommTag, value: T) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod + Zero + Add<Output = T>,
{
    fold_reduce(comm, tag, value, Some(T::zero()), |a, b| a + b)
}

/// Cluster-wide maximum.
pub fn max<C, T>(comm: &C, tag: CommTag, value: T) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod + Bounded + PartialOrd,
{
    fold_reduce(comm, tag, value, Some(T::min_value()), |a, b| {
        if b > a { b } else { a }
    })
}

/// Cluster-wide minimum.
pub fn min<C, T>(comm: &C, tag: CommTag, value: T) -> Result<T, DynoGraphError>
where
    C: Communicator,
    T: Pod + Bounded + PartialOrd,
{
    fold_reduce(comm, tag, value, Some(T::max_value()), |a, b| {
        if b < a { b } else { a }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};

    const TAG: CommTag = CommTag::new(0x7000);

    #[test]
    fn single_rank_collectives_are_identity() {
        let comm = NoComm;
        assert_eq!(broadcast_vec(&comm, TAG, 0, vec![1u64, 2]).unwrap(), vec![1, 2]);
        assert_eq!(scatter_vec(&comm, TAG, 0, vec![vec![3u64]]).unwrap(), vec![3]);
        assert_eq!(sum(&comm, TAG, 5u64).unwrap(), 5);
        assert_eq!(allgather_vec(&comm, TAG, vec![9u64]).unwrap(), vec![vec![9]]);
    }

    #[test]
    fn scatter_rejects_wrong_piece_count() {
        let err = scatter_vec(&NoComm, TAG, 0, vec![vec![1u64], vec![2]]).unwrap_err();
        assert!(matches!(err, DynoGraphError::CollectiveLayout(_)));
    }

    #[test]
    fn reductions_across_three_ranks() {
        let out = RayonComm::run(3, |comm| {
            let r = comm.rank() as u64;
            let s = sum(&comm, TAG, r + 1).unwrap();
            let m = max(&comm, TAG.offset(4), r * 10).unwrap();
            let lo = min(&comm, TAG.offset(8), 7i64 - r as i64).unwrap();
            (s, m, lo)
        });
        assert!(out.iter().all(|&x| x == (6, 20, 5)));
    }

    #[test]
    fn allgather_preserves_rank_order_and_lengths() {
        let out = RayonComm::run(3, |comm| {
            let local: Vec<u64> = (0..comm.rank() as u64).collect();
            allgather_vec(&comm, TAG, local).unwrap()
        });
        for per_rank in out {
            assert_eq!(per_rank, vec![vec![], vec![0], vec![0, 1]]);
        }
    }

    #[test]
    fn elementwise_reduction() {
        let out = RayonComm::run(2, |comm| {
            let local = if comm.rank() == 0 { vec![1i64, 5, 3] } else { vec![4, 2, 3] };
            allreduce_vec(&comm, TAG, local, i64::min).unwrap()
        });
        assert_eq!(out[0], vec![1, 2, 3]);
        assert_eq!(out[1], vec![1, 2, 3]);
    }
}
