#![allow(dead_code)]
use dyno_sieve::{
    algs::communicator::{Communicator, RayonComm},
    algs::partition::Partition,
    topology::edge::{Edge, EdgeUpdate},
    topology::shard::EdgeStore,
};

pub fn upd(src: u64, dst: u64, weight: i64, timestamp: i64) -> EdgeUpdate {
    EdgeUpdate::new(src, dst, weight, timestamp)
}

/// An empty cyclic-partitioned shard for `comm`'s rank.
pub fn shard_for<C: Communicator>(comm: &C, max_vertex_id: u64) -> EdgeStore {
    EdgeStore::new(comm.rank(), Partition::cyclic(comm.size()), max_vertex_id)
}

/// Every edge of a shard, sorted by key.
pub fn sorted_edges(store: &EdgeStore) -> Vec<Edge> {
    let mut v: Vec<Edge> = store.iter().collect();
    v.sort_unstable_by_key(|e| e.key());
    v
}

/// Run `f` on each rank of an `n`-rank in-process group.
pub fn on_ranks<F, R>(n: usize, f: F) -> Vec<R>
where
    F: Fn(RayonComm) -> R + Sync,
    R: Send,
{
    RayonComm::run(n, f)
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Clone + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
