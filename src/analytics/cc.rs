//! Weakly connected components by minimum-label propagation.
//!
//! Every vertex starts labelled with its own id. Each round, ranks push the
//! smaller endpoint label across each owned edge in both directions; the
//! lowered labels are all-gathered and min-applied everywhere. The loop ends
//! when a round lowers nothing cluster-wide.

use crate::algs::communicator::{Communicator, tags};
use crate::analytics::exchange_proposals;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;

/// Component label per vertex: the smallest id in its component.
pub fn connected_components<C: Communicator>(
    store: &EdgeStore,
    comm: &C,
) -> Result<Vec<i64>, DynoGraphError> {
    let n = store.max_vertex_id() as usize;
    let mut label: Vec<i64> = (0..n as i64).collect();
    let mut rounds = 0usize;
    loop {
        rounds += 1;
        let mut lowered = Vec::new();
        for e in store.iter() {
            let (a, b) = (label[e.src.index()], label[e.dst.index()]);
            if a < b {
                lowered.push((e.dst, a));
            } else if b < a {
                lowered.push((e.src, b));
            }
        }
        let proposals = exchange_proposals(comm, tags::CC, &lowered)?;
        if proposals.is_empty() {
            break;
        }
        for (v, l) in proposals {
            let slot = &mut label[v.index()];
            *slot = (*slot).min(l);
        }
    }
    log::debug!("cc converged after {rounds} rounds");
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::partition::Partition;
    use crate::topology::edge::Edge;

    #[test]
    fn direction_is_ignored() {
        let mut s = EdgeStore::new(0, Partition::cyclic(1), 8);
        for (a, b) in [(5, 2), (3, 5), (6, 7)] {
            s.insert(Edge::new(a, b, 1, 0)).unwrap();
        }
        let label = connected_components(&s, &NoComm).unwrap();
        assert_eq!(label, vec![0, 1, 2, 2, 4, 2, 6, 6]);
    }
}
