//! Delta-stepping single-source shortest paths.
//!
//! Tentative distances are replicated. Vertices are filed into buckets of
//! width `delta` (an ordered map, so only reached vertices are ever
//! visited); the lowest non-empty bucket is relaxed repeatedly (each
//! rank relaxing the edges of the bucket vertices it owns, proposals
//! all-gathered and min-applied everywhere) until it stops changing, then it
//! is settled and the next bucket is processed.
//!
//! Edge weights are accumulated deltas and may be negative; they are clamped
//! to zero for path lengths.

use crate::algs::collective::max;
use crate::algs::communicator::{Communicator, tags};
use crate::analytics::exchange_proposals;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;
use std::collections::BTreeMap;

/// Distance of vertices no source reaches.
pub const UNREACHED: i64 = i64::MAX;

/// Bucket width: a quarter of the heaviest edge, at least 1. Collective.
pub fn default_delta<C: Communicator>(store: &EdgeStore, comm: &C) -> Result<i64, DynoGraphError> {
    let local = store.iter().map(|e| e.weight.max(0)).max().unwrap_or(0);
    let heaviest = max(comm, tags::SSSP.offset(8), local)?;
    Ok((heaviest / 4).max(1))
}

pub fn sssp<C: Communicator>(
    store: &EdgeStore,
    sources: &[VertexId],
    comm: &C,
) -> Result<Vec<i64>, DynoGraphError> {
    let delta = default_delta(store, comm)?;
    sssp_with_delta(store, sources, delta, comm)
}

pub fn sssp_with_delta<C: Communicator>(
    store: &EdgeStore,
    sources: &[VertexId],
    delta: i64,
    comm: &C,
) -> Result<Vec<i64>, DynoGraphError> {
    if delta <= 0 {
        return Err(DynoGraphError::InvalidArgument {
            name: "delta",
            reason: format!("bucket width must be positive, got {delta}"),
        });
    }
    let n = store.max_vertex_id() as usize;
    let mut dist = vec![UNREACHED; n];
    let mut settled = vec![false; n];
    // bucket index -> vertices filed there; entries go stale when a vertex
    // moves to a lower bucket and are skipped on pop
    let mut buckets: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for &s in sources {
        store.partition().try_owner(s, store.max_vertex_id())?;
        if dist[s.index()] != 0 {
            dist[s.index()] = 0;
            buckets.entry(0).or_default().push(s.index());
        }
    }

    let bucket_of = |d: i64| d / delta;
    let mut processed = 0usize;
    while let Some((current, filed)) = buckets.pop_first() {
        let mut active: Vec<usize> = filed
            .into_iter()
            .filter(|&v| !settled[v] && bucket_of(dist[v]) == current)
            .collect();
        active.sort_unstable();
        active.dedup();
        if active.is_empty() {
            continue;
        }
        processed += 1;

        let mut members = Vec::new();
        while !active.is_empty() {
            let mut proposals = Vec::new();
            for &u in &active {
                let uid = VertexId::new(u as u64);
                if !store.owns(uid) {
                    continue;
                }
                for (v, attrs) in store.out_edges(uid) {
                    let candidate = dist[u].saturating_add(attrs.weight.max(0));
                    if candidate < dist[v.index()] {
                        proposals.push((v, candidate));
                    }
                }
            }

            members.append(&mut active);
            for (v, d) in exchange_proposals(comm, tags::SSSP, &proposals)? {
                let i = v.index();
                if d < dist[i] {
                    dist[i] = d;
                    match bucket_of(d) {
                        b if b == current => active.push(i),
                        b => buckets.entry(b).or_default().push(i),
                    }
                }
            }
            active.sort_unstable();
            active.dedup();
        }

        for v in members {
            settled[v] = true;
        }
    }
    log::debug!("sssp settled {processed} buckets with delta {delta}");
    Ok(dist)
}
