//! Per-rank edge store.
//!
//! An [`EdgeStore`] holds exactly the edges whose source vertex this rank
//! owns, grouped by source: `src -> (dst -> attrs)`. A source whose last edge
//! is removed disappears from the map, so the number of groups is the number
//! of owned vertices with nonzero out-degree. No two ranks ever hold the same
//! `(src, dst)` key.

use crate::algs::partition::{Partition, PartitionId};
use crate::graph_error::DynoGraphError;
use crate::topology::edge::{Edge, EdgeAttrs, EdgeKey};
use crate::topology::vertex::VertexId;
use hashbrown::HashMap;

/// The shard of the distributed graph owned by one rank.
#[derive(Clone, Debug)]
pub struct EdgeStore {
    rank: PartitionId,
    partition: Partition,
    max_vertex_id: u64,
    adjacency: HashMap<VertexId, HashMap<VertexId, EdgeAttrs>>,
    num_edges: usize,
}

impl EdgeStore {
    /// Create an empty shard for `rank`, sized for ids in `[0, max_vertex_id)`.
    pub fn new(rank: PartitionId, partition: Partition, max_vertex_id: u64) -> Self {
        Self {
            rank,
            partition,
            max_vertex_id,
            adjacency: HashMap::new(),
            num_edges: 0,
        }
    }

    pub fn rank(&self) -> PartitionId {
        self.rank
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn max_vertex_id(&self) -> u64 {
        self.max_vertex_id
    }

    /// True if this rank owns `v` (and therefore every edge leaving it).
    #[inline]
    pub fn owns(&self, v: VertexId) -> bool {
        self.partition.owner(v) == self.rank
    }

    /// Check that an edge may be installed here: both endpoints in range and
    /// the source owned by this rank.
    pub fn check_local(&self, src: VertexId, dst: VertexId) -> Result<(), DynoGraphError> {
        let owner = self.partition.try_owner(src, self.max_vertex_id)?;
        if !dst.is_valid_endpoint(self.max_vertex_id) {
            return Err(DynoGraphError::VertexOutOfRange {
                vertex: dst,
                max_vertex_id: self.max_vertex_id,
            });
        }
        if owner != self.rank {
            return Err(DynoGraphError::OwnershipViolation {
                src,
                owner,
                rank: self.rank,
            });
        }
        Ok(())
    }

    /// Install `edge`, replacing any existing attributes for its key.
    /// Returns the replaced attributes, if any.
    pub fn insert(&mut self, edge: Edge) -> Result<Option<EdgeAttrs>, DynoGraphError> {
        self.check_local(edge.src, edge.dst)?;
        let prev = self
            .adjacency
            .entry(edge.src)
            .or_default()
            .insert(edge.dst, edge.attrs());
        if prev.is_none() {
            self.num_edges += 1;
        }
        Ok(prev)
    }

    pub fn get(&self, src: VertexId, dst: VertexId) -> Option<&EdgeAttrs> {
        self.adjacency.get(&src)?.get(&dst)
    }

    pub fn get_mut(&mut self, src: VertexId, dst: VertexId) -> Option<&mut EdgeAttrs> {
        self.adjacency.get_mut(&src)?.get_mut(&dst)
    }

    pub fn contains(&self, src: VertexId, dst: VertexId) -> bool {
        self.get(src, dst).is_some()
    }

    pub fn remove(&mut self, src: VertexId, dst: VertexId) -> Option<EdgeAttrs> {
        let row = self.adjacency.get_mut(&src)?;
        let removed = row.remove(&dst)?;
        if row.is_empty() {
            self.adjacency.remove(&src);
        }
        self.num_edges -= 1;
        Some(removed)
    }

    /// Keep only edges for which `keep` returns true. Returns how many were removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&EdgeKey, &EdgeAttrs) -> bool,
    {
        let mut removed = 0;
        self.adjacency.retain(|&src, row| {
            row.retain(|&dst, attrs| {
                let k = keep(&(src, dst), attrs);
                if !k {
                    removed += 1;
                }
                k
            });
            !row.is_empty()
        });
        self.num_edges -= removed;
        removed
    }

    /// Iterate every local edge in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().flat_map(|(&src, row)| {
            row.iter().map(move |(&dst, a)| Edge {
                src,
                dst,
                weight: a.weight,
                timestamp: a.timestamp,
            })
        })
    }

    /// Out-neighbours of `src`; empty unless this rank owns it.
    pub fn out_edges(&self, src: VertexId) -> impl Iterator<Item = (VertexId, &EdgeAttrs)> + '_ {
        self.adjacency
            .get(&src)
            .into_iter()
            .flat_map(|row| row.iter().map(|(&d, a)| (d, a)))
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn is_empty(&self) -> bool {
        self.num_edges == 0
    }

    /// Out-degree of `v` on this rank; zero for vertices owned elsewhere.
    pub fn out_degree(&self, v: VertexId) -> usize {
        self.adjacency.get(&v).map_or(0, HashMap::len)
    }

    /// Owned vertices with at least one outgoing edge.
    pub fn num_active_vertices(&self) -> usize {
        self.adjacency.len()
    }

    /// `(vertex, out_degree)` for every owned vertex with a nonzero degree.
    pub fn degrees(&self) -> impl Iterator<Item = (VertexId, usize)> + '_ {
        self.adjacency.iter().map(|(&v, row)| (v, row.len()))
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.num_edges = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(rank: usize) -> EdgeStore {
        EdgeStore::new(rank, Partition::cyclic(2), 10)
    }

    #[test]
    fn insert_tracks_degree() {
        let mut s = store(1);
        assert!(s.insert(Edge::new(1, 2, 5, 100)).unwrap().is_none());
        assert!(s.insert(Edge::new(1, 4, 1, 100)).unwrap().is_none());
        assert_eq!(s.out_degree(VertexId::new(1)), 2);
        assert_eq!(s.num_edges(), 2);
        assert_eq!(s.num_active_vertices(), 1);

        let prev = s.insert(Edge::new(1, 2, 7, 101)).unwrap();
        assert_eq!(prev, Some(EdgeAttrs::new(5, 100)));
        assert_eq!(s.out_degree(VertexId::new(1)), 2);
    }

    #[test]
    fn insert_rejects_foreign_source() {
        let mut s = store(0);
        let err = s.insert(Edge::new(3, 4, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            DynoGraphError::OwnershipViolation { owner: 1, rank: 0, .. }
        ));
        assert!(s.is_empty());
    }

    #[test]
    fn insert_rejects_out_of_range() {
        let mut s = store(0);
        assert!(matches!(
            s.insert(Edge::new(2, 10, 1, 1)),
            Err(DynoGraphError::VertexOutOfRange { .. })
        ));
        assert!(matches!(
            s.insert(Edge::new(0, 2, 1, 1)),
            Err(DynoGraphError::VertexOutOfRange { .. })
        ));
    }

    #[test]
    fn remove_and_retain_update_degrees() {
        let mut s = store(1);
        s.insert(Edge::new(1, 2, 1, 10)).unwrap();
        s.insert(Edge::new(1, 3, 1, 20)).unwrap();
        s.insert(Edge::new(3, 4, 1, 30)).unwrap();

        assert!(s.remove(VertexId::new(1), VertexId::new(2)).is_some());
        assert_eq!(s.out_degree(VertexId::new(1)), 1);

        let removed = s.retain(|_, a| a.timestamp >= 25);
        assert_eq!(removed, 1);
        assert_eq!(s.out_degree(VertexId::new(1)), 0);
        assert_eq!(s.num_active_vertices(), 1);
        assert_eq!(s.num_edges(), 1);
    }
}
