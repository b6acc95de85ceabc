//! Fold a rank's routed updates into its edge store.
//!
//! Merge semantics: for every `(src, dst)` key present in the update list,
//! the stored weight becomes the prior weight (0 for a new edge) plus the sum
//! of all deltas for that key, and the stored timestamp becomes the maximum
//! of the prior timestamp and every update's timestamp. Both operations are
//! commutative and associative, so the arrival order inside a batch does not
//! change the result.

use crate::graph_error::DynoGraphError;
use crate::topology::edge::{Edge, EdgeAttrs, EdgeUpdate};
use crate::topology::shard::EdgeStore;
use itertools::Itertools;
use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};

/// How a batch is applied to the store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestMode {
    /// Duplicate-aware merge against existing edges.
    #[default]
    Incremental,
    /// Bulk load: every update is installed as-is, later duplicates
    /// overwrite earlier ones. Only meaningful on an empty store.
    Snapshot,
}

/// Counters reported by one ingestion pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Existing edges that absorbed at least one update.
    pub updated_edges: usize,
    /// Edges created by this pass.
    pub inserted_edges: usize,
    /// Updates folded into some edge (equals the input length on success).
    pub consumed_updates: usize,
}

/// Apply `updates` to `store` using `mode`.
pub fn ingest(
    store: &mut EdgeStore,
    updates: &mut [EdgeUpdate],
    mode: IngestMode,
) -> Result<MergeStats, DynoGraphError> {
    match mode {
        IngestMode::Incremental => merge_updates(store, updates),
        IngestMode::Snapshot => insert_snapshot(store, updates),
    }
}

/// Duplicate-aware merge.
///
/// 1. Validate every update (range and local ownership) before touching the store.
/// 2. Sort by `(src, dst)` so duplicates are adjacent.
/// 3. Runs whose key already exists are folded into the stored edge and marked done.
/// 4. Remaining runs are folded into one new edge each.
pub fn merge_updates(
    store: &mut EdgeStore,
    updates: &mut [EdgeUpdate],
) -> Result<MergeStats, DynoGraphError> {
    for u in updates.iter() {
        store.check_local(u.src, u.dst)?;
    }
    updates.par_sort_unstable_by_key(|u| u.key());

    let mut stats = MergeStats::default();

    for run in updates.chunk_by_mut(|a, b| a.key() == b.key()) {
        let (src, dst) = run[0].key();
        if let Some(existing) = store.get_mut(src, dst) {
            for u in run.iter_mut() {
                existing.absorb(u.weight, u.timestamp);
                u.mark_done();
            }
            stats.updated_edges += 1;
        }
    }

    let fresh: Vec<Edge> = updates
        .iter_mut()
        .filter(|u| !u.is_done())
        .chunk_by(|u| u.key())
        .into_iter()
        .map(|((src, dst), run)| {
            let mut attrs = EdgeAttrs::new(0, i64::MIN);
            for u in run {
                attrs.absorb(u.weight, u.timestamp);
                u.mark_done();
            }
            Edge {
                src,
                dst,
                weight: attrs.weight,
                timestamp: attrs.timestamp,
            }
        })
        .collect();

    for edge in fresh {
        store.insert(edge)?;
        stats.inserted_edges += 1;
    }
    stats.consumed_updates = updates.iter().filter(|u| u.is_done()).count();

    log::debug!(
        "rank {} merged {} updates: {} edges updated, {} inserted",
        store.rank(),
        updates.len(),
        stats.updated_edges,
        stats.inserted_edges
    );
    Ok(stats)
}

/// Bulk load without duplicate detection.
pub fn insert_snapshot(
    store: &mut EdgeStore,
    updates: &mut [EdgeUpdate],
) -> Result<MergeStats, DynoGraphError> {
    if !store.is_empty() {
        log::warn!(
            "rank {} snapshot-loading into a store that already holds {} edges",
            store.rank(),
            store.num_edges()
        );
    }
    let mut stats = MergeStats::default();
    for u in updates.iter_mut() {
        if store.insert(u.as_edge())?.is_some() {
            stats.updated_edges += 1;
        } else {
            stats.inserted_edges += 1;
        }
        u.mark_done();
        stats.consumed_updates += 1;
    }
    Ok(stats)
}
