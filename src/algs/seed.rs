//! Source-vertex selection for traversal analytics.
//!
//! Every rank owns an identically seeded [`SourcePicker`], so all ranks draw
//! the same candidate sequence and agree on the chosen vertex without a
//! broadcast of the choice itself.

use crate::algs::collective::max;
use crate::algs::communicator::{Communicator, tags};
use crate::algs::query::{local_degree, top_n_high_degree};
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_TRIES: usize = 10_000;

/// Deterministic pseudo-random picker of vertices with nonzero out-degree.
#[derive(Debug, Clone)]
pub struct SourcePicker {
    rng: SmallRng,
    max_tries: usize,
}

impl Default for SourcePicker {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl SourcePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            max_tries: DEFAULT_MAX_TRIES,
        }
    }

    pub fn with_max_tries(mut self, max_tries: usize) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Draw candidates until one has a nonzero cluster-wide out-degree.
    ///
    /// Collective: every rank must call this with its own picker in the same
    /// state. Each try costs one max-reduction.
    pub fn next_source<C: Communicator>(
        &mut self,
        store: &EdgeStore,
        comm: &C,
    ) -> Result<VertexId, DynoGraphError> {
        let max_vertex_id = store.max_vertex_id();
        if max_vertex_id <= 1 {
            return Err(DynoGraphError::SeedSelectionExhausted { tries: 0 });
        }
        for attempt in 0..self.max_tries {
            let candidate = VertexId::new(self.rng.gen_range(1..max_vertex_id));
            let d = max(comm, tags::SEED_DEGREE, local_degree(store, candidate) as u64)?;
            if d > 0 {
                log::debug!("picked source {candidate} after {} tries", attempt + 1);
                return Ok(candidate);
            }
        }
        Err(DynoGraphError::SeedSelectionExhausted {
            tries: self.max_tries,
        })
    }
}

/// The highest-degree vertex in the cluster (ties go to the larger id), or
/// `None` when the graph has no edges.
pub fn highest_degree_source<C: Communicator>(
    store: &EdgeStore,
    comm: &C,
) -> Result<Option<VertexId>, DynoGraphError> {
    Ok(top_n_high_degree(store, 1, comm)?
        .first()
        .map(|&(v, _)| v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, RayonComm};
    use crate::algs::partition::Partition;
    use crate::topology::edge::Edge;

    #[test]
    fn picks_a_vertex_with_edges() {
        let mut s = EdgeStore::new(0, Partition::cyclic(1), 100);
        s.insert(Edge::new(7, 8, 1, 1)).unwrap();
        let v = SourcePicker::default().next_source(&s, &NoComm).unwrap();
        assert_eq!(v, VertexId::new(7));
    }

    #[test]
    fn empty_graph_exhausts() {
        let s = EdgeStore::new(0, Partition::cyclic(1), 100);
        let err = SourcePicker::new(1)
            .with_max_tries(5)
            .next_source(&s, &NoComm)
            .unwrap_err();
        assert!(matches!(err, DynoGraphError::SeedSelectionExhausted { tries: 5 }));
    }

    #[test]
    fn ranks_agree_on_source() {
        let picks = RayonComm::run(2, |comm| {
            let mut s = EdgeStore::new(comm.rank(), Partition::cyclic(2), 20);
            for src in (1..20u64).filter(|v| v % 2 == comm.rank() as u64) {
                s.insert(Edge::new(src, 1, 1, 1)).unwrap();
            }
            let mut picker = SourcePicker::default();
            let a = picker.next_source(&s, &comm).unwrap();
            let b = picker.next_source(&s, &comm).unwrap();
            (a, b)
        });
        assert_eq!(picks[0], picks[1]);
    }

    #[test]
    fn highest_degree_prefers_larger_id_on_ties() {
        let mut s = EdgeStore::new(0, Partition::cyclic(1), 10);
        s.insert(Edge::new(2, 3, 1, 1)).unwrap();
        s.insert(Edge::new(5, 3, 1, 1)).unwrap();
        assert_eq!(highest_degree_source(&s, &NoComm).unwrap(), Some(VertexId::new(5)));
        let empty = EdgeStore::new(0, Partition::cyclic(1), 10);
        assert_eq!(highest_degree_source(&empty, &NoComm).unwrap(), None);
    }
}
