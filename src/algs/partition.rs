//! Vertex-ownership partitioning.
//!
//! A [`Partition`] maps every vertex id to exactly one owning rank. It is a
//! pure function of the id and the partition parameters, so every rank
//! evaluates it locally and gets the same answer without communicating.
//! Edges are owned by the owner of their source vertex.

use crate::graph_error::DynoGraphError;
use crate::topology::vertex::VertexId;
use serde::{Deserialize, Serialize};

/// Rank index inside a communicator.
pub type PartitionId = usize;

/// Deterministic vertex → rank assignment, fixed for the lifetime of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Partition {
    /// Round-robin: `owner(v) = v % n_parts`.
    Cyclic { n_parts: usize },
    /// Contiguous ranges of `ceil(max_vertex_id / n_parts)` ids per rank.
    Block { n_parts: usize, max_vertex_id: u64 },
}

/// Which partition layout to build once `max_vertex_id` is known.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionScheme {
    #[default]
    Cyclic,
    Block,
}

impl PartitionScheme {
    pub fn build(self, n_parts: usize, max_vertex_id: u64) -> Partition {
        match self {
            PartitionScheme::Cyclic => Partition::cyclic(n_parts),
            PartitionScheme::Block => Partition::block(n_parts, max_vertex_id),
        }
    }
}

impl std::str::FromStr for PartitionScheme {
    type Err = DynoGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cyclic" | "round-robin" => Ok(PartitionScheme::Cyclic),
            "block" => Ok(PartitionScheme::Block),
            other => Err(DynoGraphError::InvalidArgument {
                name: "partition",
                reason: format!("unknown partition scheme `{other}`"),
            }),
        }
    }
}

impl Partition {
    pub fn cyclic(n_parts: usize) -> Self {
        Partition::Cyclic {
            n_parts: n_parts.max(1),
        }
    }

    pub fn block(n_parts: usize, max_vertex_id: u64) -> Self {
        Partition::Block {
            n_parts: n_parts.max(1),
            max_vertex_id,
        }
    }

    pub fn n_parts(&self) -> usize {
        match *self {
            Partition::Cyclic { n_parts } | Partition::Block { n_parts, .. } => n_parts,
        }
    }

    /// Owning rank of `v`. Total over all ids; ids beyond a block layout's
    /// range land on the last rank.
    #[inline]
    pub fn owner(&self, v: VertexId) -> PartitionId {
        match *self {
            Partition::Cyclic { n_parts } => (v.get() % n_parts as u64) as usize,
            Partition::Block {
                n_parts,
                max_vertex_id,
            } => {
                let chunk = block_len(n_parts, max_vertex_id);
                ((v.get() / chunk) as usize).min(n_parts - 1)
            }
        }
    }

    /// Owning rank of an edge endpoint, rejecting ids that cannot appear in
    /// a graph with `max_vertex_id` vertices.
    pub fn try_owner(
        &self,
        v: VertexId,
        max_vertex_id: u64,
    ) -> Result<PartitionId, DynoGraphError> {
        if !v.is_valid_endpoint(max_vertex_id) {
            return Err(DynoGraphError::VertexOutOfRange {
                vertex: v,
                max_vertex_id,
            });
        }
        Ok(self.owner(v))
    }

    /// All ids in `[0, max_vertex_id)` owned by `rank`, ascending.
    pub fn owned_vertices(
        &self,
        rank: PartitionId,
        max_vertex_id: u64,
    ) -> Box<dyn Iterator<Item = VertexId> + '_> {
        match *self {
            Partition::Cyclic { n_parts } => Box::new(
                (rank as u64..max_vertex_id)
                    .step_by(n_parts)
                    .map(VertexId::new),
            ),
            Partition::Block { n_parts, .. } => {
                let chunk = block_len(n_parts, max_vertex_id);
                let start = (rank as u64).saturating_mul(chunk).min(max_vertex_id);
                let end = if rank + 1 == n_parts {
                    max_vertex_id
                } else {
                    start.saturating_add(chunk).min(max_vertex_id)
                };
                Box::new((start..end).map(VertexId::new))
            }
        }
    }
}

#[inline]
fn block_len(n_parts: usize, max_vertex_id: u64) -> u64 {
    max_vertex_id.div_ceil(n_parts as u64).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_is_mod() {
        let p = Partition::cyclic(2);
        assert_eq!(p.owner(VertexId::new(1)), 1);
        assert_eq!(p.owner(VertexId::new(3)), 1);
        assert_eq!(p.owner(VertexId::new(4)), 0);
    }

    #[test]
    fn block_ranges_cover_all_ids_once() {
        let max = 11;
        let p = Partition::block(3, max);
        let mut seen = vec![0usize; max as usize];
        for rank in 0..3 {
            for v in p.owned_vertices(rank, max) {
                assert_eq!(p.owner(v), rank);
                seen[v.index()] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "seen = {seen:?}");
    }

    #[test]
    fn cyclic_owned_vertices_match_owner() {
        let p = Partition::cyclic(3);
        let owned: Vec<u64> = p.owned_vertices(1, 10).map(|v| v.get()).collect();
        assert_eq!(owned, vec![1, 4, 7]);
    }

    #[test]
    fn try_owner_rejects_zero_and_overflow() {
        let p = Partition::cyclic(2);
        assert!(p.try_owner(VertexId::new(0), 10).is_err());
        assert!(p.try_owner(VertexId::new(10), 10).is_err());
        assert_eq!(p.try_owner(VertexId::new(9), 10).unwrap(), 1);
    }

    #[test]
    fn scheme_parses() {
        assert_eq!("block".parse::<PartitionScheme>().unwrap(), PartitionScheme::Block);
        assert!("metis".parse::<PartitionScheme>().is_err());
    }
}
