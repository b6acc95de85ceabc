//! Replicated CSR view of the whole graph.
//!
//! Algorithms that need random access to arbitrary vertices' adjacency
//! (colouring, betweenness) all-gather every rank's edges and build the same
//! snapshot everywhere.

use crate::algs::collective::allgather_vec;
use crate::algs::communicator::{Communicator, tags};
use crate::algs::wire::WireEdge;
use crate::graph_error::DynoGraphError;
use crate::topology::edge::Edge;
use crate::topology::shard::EdgeStore;

/// Compressed sparse rows over vertex ids `0..num_vertices`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    num_vertices: usize,
    offsets: Vec<usize>,
    targets: Vec<u64>,
    weights: Vec<i64>,
}

impl GraphSnapshot {
    /// Build from an edge list; rows are sorted by target.
    pub fn from_edges(num_vertices: usize, mut edges: Vec<Edge>) -> Self {
        edges.sort_unstable_by_key(|e| e.key());
        let mut offsets = vec![0usize; num_vertices + 1];
        for e in &edges {
            offsets[e.src.index() + 1] += 1;
        }
        for i in 0..num_vertices {
            offsets[i + 1] += offsets[i];
        }
        Self {
            num_vertices,
            offsets,
            targets: edges.iter().map(|e| e.dst.get()).collect(),
            weights: edges.iter().map(|e| e.weight).collect(),
        }
    }

    /// All-gather every rank's edges. Collective.
    pub fn gather<C: Communicator>(store: &EdgeStore, comm: &C) -> Result<Self, DynoGraphError> {
        let local: Vec<WireEdge> = store.iter().map(|e| WireEdge::from(&e)).collect();
        let all = allgather_vec(comm, tags::SNAPSHOT, local)?;
        let edges: Vec<Edge> = all.into_iter().flatten().map(|w| w.to_edge()).collect();
        Ok(Self::from_edges(store.max_vertex_id() as usize, edges))
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    pub fn out_degree(&self, v: usize) -> usize {
        self.offsets[v + 1] - self.offsets[v]
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.targets[self.offsets[v]..self.offsets[v + 1]]
            .iter()
            .map(|&t| t as usize)
    }

    pub fn weighted_neighbors(&self, v: usize) -> impl Iterator<Item = (usize, i64)> + '_ {
        let range = self.offsets[v]..self.offsets[v + 1];
        self.targets[range.clone()]
            .iter()
            .zip(&self.weights[range])
            .map(|(&t, &w)| (t as usize, w))
    }

    /// Symmetrized adjacency lists without self-loops or duplicates.
    pub fn undirected(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.num_vertices];
        for u in 0..self.num_vertices {
            for v in self.neighbors(u) {
                if u != v {
                    adj[u].push(v);
                    adj[v].push(u);
                }
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_rows_match_edges() {
        let snap = GraphSnapshot::from_edges(
            5,
            vec![Edge::new(3, 1, 2, 0), Edge::new(1, 4, 1, 0), Edge::new(1, 2, 7, 0)],
        );
        assert_eq!(snap.num_edges(), 3);
        assert_eq!(snap.neighbors(1).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(snap.weighted_neighbors(3).collect::<Vec<_>>(), vec![(1, 2)]);
        assert_eq!(snap.out_degree(2), 0);
        assert_eq!(snap.undirected()[1], vec![2, 3, 4]);
    }
}
