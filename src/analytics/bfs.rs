//! Level-synchronous breadth-first search.
//!
//! The level array is replicated. Each level, every rank expands the frontier
//! vertices it owns and the newly discovered vertices are all-gathered, so all
//! ranks advance the same frontier.

use crate::algs::communicator::{Communicator, tags};
use crate::analytics::exchange_proposals;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;

/// Level value of vertices no source reaches.
pub const UNREACHED: i64 = -1;

/// Hop distance from the nearest source, [`UNREACHED`] elsewhere.
pub fn bfs<C: Communicator>(
    store: &EdgeStore,
    sources: &[VertexId],
    comm: &C,
) -> Result<Vec<i64>, DynoGraphError> {
    let n = store.max_vertex_id() as usize;
    let mut level = vec![UNREACHED; n];
    let mut frontier = Vec::new();
    for &s in sources {
        store.partition().try_owner(s, store.max_vertex_id())?;
        if level[s.index()] == UNREACHED {
            level[s.index()] = 0;
            frontier.push(s);
        }
    }

    let mut depth = 0;
    while !frontier.is_empty() {
        depth += 1;
        let mut discovered = Vec::new();
        for &u in frontier.iter().filter(|&&u| store.owns(u)) {
            for (v, _) in store.out_edges(u) {
                if level[v.index()] == UNREACHED {
                    discovered.push((v, depth));
                }
            }
        }
        discovered.sort_unstable();
        discovered.dedup();

        frontier.clear();
        for (v, d) in exchange_proposals(comm, tags::BFS, &discovered)? {
            if level[v.index()] == UNREACHED {
                level[v.index()] = d;
                frontier.push(v);
            }
        }
    }
    log::debug!("bfs finished after {depth} levels");
    Ok(level)
}
