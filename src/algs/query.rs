//! Cluster-wide aggregate queries over the distributed store.
//!
//! Each query computes a rank-local partial answer and combines the partials
//! with a collective, so every rank receives the same cluster-wide value.
//!
//! Degree semantics: [`local_degree`] is the raw per-rank value (nonzero only
//! on the owner); [`degree`] is the cluster-wide answer, obtained with a max
//! reduction since at most one rank contributes a nonzero value.

use crate::algs::collective::{allgather_vec, max, sum};
use crate::algs::communicator::{Communicator, tags};
use crate::algs::wire::WireDegree;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Vertices with at least one outgoing edge, summed over all ranks.
///
/// A vertex whose last edge was evicted drops out of this count without an
/// explicit delete.
pub fn vertex_count<C: Communicator>(store: &EdgeStore, comm: &C) -> Result<u64, DynoGraphError> {
    sum(comm, tags::QUERY_REDUCE, store.num_active_vertices() as u64)
}

/// Edges summed over all ranks.
pub fn edge_count<C: Communicator>(store: &EdgeStore, comm: &C) -> Result<u64, DynoGraphError> {
    sum(comm, tags::QUERY_REDUCE.offset(2), store.num_edges() as u64)
}

/// Out-degree of `v` as seen by this rank: zero unless this rank owns `v`.
pub fn local_degree(store: &EdgeStore, v: VertexId) -> usize {
    if store.owns(v) { store.out_degree(v) } else { 0 }
}

/// Cluster-wide out-degree of `v`. Every rank must call this with the same `v`.
pub fn degree<C: Communicator>(
    store: &EdgeStore,
    v: VertexId,
    comm: &C,
) -> Result<u64, DynoGraphError> {
    max(comm, tags::QUERY_REDUCE.offset(4), local_degree(store, v) as u64)
}

/// Total order used for high-degree selection: degree descending, then the
/// larger vertex id first.
pub fn by_degree_desc(a: &(VertexId, usize), b: &(VertexId, usize)) -> Ordering {
    b.1.cmp(&a.1).then(b.0.cmp(&a.0))
}

/// The `n` highest-degree vertices in the cluster, ordered by [`by_degree_desc`].
///
/// Each rank keeps its local top `n`, the lists are all-gathered (at most
/// `n × size` entries) and every rank sorts and truncates the combined list,
/// so all ranks return the same vector.
pub fn top_n_high_degree<C: Communicator>(
    store: &EdgeStore,
    n: usize,
    comm: &C,
) -> Result<Vec<(VertexId, usize)>, DynoGraphError> {
    let mut local: Vec<(VertexId, usize)> = store.degrees().collect();
    local.sort_unstable_by(by_degree_desc);
    local.truncate(n);

    let wire: Vec<WireDegree> = local.iter().map(|&(v, d)| WireDegree::new(v, d)).collect();
    let gathered = allgather_vec(comm, tags::QUERY_TOP_N, wire)?;

    let mut global: Vec<(VertexId, usize)> = gathered
        .into_iter()
        .flatten()
        .map(|w| (w.vertex(), w.degree()))
        .collect();
    global.sort_unstable_by(by_degree_desc);
    global.truncate(n);
    Ok(global)
}

/// One progress record, printed as a JSON line after every batch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub pid: usize,
    pub num_vertices: u64,
    pub num_edges: u64,
}

impl GraphSummary {
    /// Collect cluster-wide counts; `pid` is this rank.
    pub fn collect<C: Communicator>(store: &EdgeStore, comm: &C) -> Result<Self, DynoGraphError> {
        Ok(Self {
            pid: comm.rank(),
            num_vertices: vertex_count(store, comm)?,
            num_edges: edge_count(store, comm)?,
        })
    }

    pub fn to_json_line(&self) -> Result<String, DynoGraphError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::partition::Partition;
    use crate::topology::edge::Edge;

    fn store() -> EdgeStore {
        let mut s = EdgeStore::new(0, Partition::cyclic(1), 10);
        for (a, b) in [(1, 2), (1, 3), (2, 3), (4, 1), (4, 2), (5, 1)] {
            s.insert(Edge::new(a, b, 1, 1)).unwrap();
        }
        s
    }

    #[test]
    fn counts_on_single_rank() {
        let s = store();
        assert_eq!(vertex_count(&s, &NoComm).unwrap(), 4);
        assert_eq!(edge_count(&s, &NoComm).unwrap(), 6);
        assert_eq!(degree(&s, VertexId::new(1), &NoComm).unwrap(), 2);
        assert_eq!(degree(&s, VertexId::new(3), &NoComm).unwrap(), 0);
    }

    #[test]
    fn top_n_breaks_ties_by_larger_id() {
        let s = store();
        let top = top_n_high_degree(&s, 2, &NoComm).unwrap();
        assert_eq!(top, vec![(VertexId::new(4), 2), (VertexId::new(1), 2)]);
        let all = top_n_high_degree(&s, 10, &NoComm).unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn summary_serializes_as_progress_line() {
        let s = store();
        let line = GraphSummary::collect(&s, &NoComm).unwrap().to_json_line().unwrap();
        assert_eq!(line, r#"{"pid":0,"num_vertices":4,"num_edges":6}"#);
    }
}
