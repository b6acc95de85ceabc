//! Sliding-window eviction.
//!
//! Eviction is rank-local (each rank owns disjoint edges), but callers must
//! synchronize afterwards before any aggregate query; [`evict_and_synchronize`]
//! does both.

use crate::algs::communicator::Communicator;
use crate::topology::shard::EdgeStore;
use serde::{Deserialize, Serialize};

/// Remove every local edge with `timestamp < threshold`. Returns the number removed.
pub fn evict_older_than(store: &mut EdgeStore, threshold: i64) -> usize {
    let removed = store.retain(|_, attrs| attrs.timestamp >= threshold);
    log::debug!(
        "rank {} evicted {removed} edges older than {threshold}",
        store.rank()
    );
    removed
}

/// Evict locally, then wait for every rank to finish evicting.
pub fn evict_and_synchronize<C: Communicator>(
    store: &mut EdgeStore,
    threshold: i64,
    comm: &C,
) -> usize {
    let removed = evict_older_than(store, threshold);
    comm.barrier();
    removed
}

/// Window parameters as configured for a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionWindow {
    /// Width of the window in timestamp units.
    pub size: i64,
    /// When false the window is never applied.
    pub deletions_enabled: bool,
}

impl RetentionWindow {
    /// Decode the command-line convention: a negative size enables deletions
    /// and its absolute value is the window width.
    pub fn from_signed(window: i64) -> Self {
        Self {
            size: window.saturating_abs(),
            deletions_enabled: window < 0,
        }
    }

    /// Retention threshold for a batch whose newest edge has `batch_max_timestamp`.
    pub fn threshold_for(&self, batch_max_timestamp: i64) -> i64 {
        batch_max_timestamp.saturating_sub(self.size)
    }
}

/// The monotonically advancing retention threshold of one trial.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Retention {
    threshold: i64,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            threshold: i64::MIN,
        }
    }
}

impl Retention {
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Move the threshold forward to `candidate`; never moves it back.
    pub fn advance(&mut self, candidate: i64) -> i64 {
        self.threshold = self.threshold.max(candidate);
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::partition::Partition;
    use crate::topology::edge::Edge;

    fn populated() -> EdgeStore {
        let mut s = EdgeStore::new(0, Partition::cyclic(1), 10);
        s.insert(Edge::new(1, 2, 8, 100)).unwrap();
        s.insert(Edge::new(3, 4, 1, 50)).unwrap();
        s.insert(Edge::new(5, 6, 1, 60)).unwrap();
        s
    }

    #[test]
    fn threshold_is_exclusive_lower_bound() {
        let mut s = populated();
        assert_eq!(evict_older_than(&mut s, 60), 1);
        assert_eq!(s.num_edges(), 2);
        assert!(s.get(5.into(), 6.into()).is_some());
    }

    #[test]
    fn eviction_is_idempotent() {
        let mut s = populated();
        evict_and_synchronize(&mut s, 61, &NoComm);
        let once: Vec<_> = {
            let mut v: Vec<_> = s.iter().collect();
            v.sort_by_key(|e| e.key());
            v
        };
        assert_eq!(evict_and_synchronize(&mut s, 61, &NoComm), 0);
        let mut twice: Vec<_> = s.iter().collect();
        twice.sort_by_key(|e| e.key());
        assert_eq!(once, twice);
    }

    #[test]
    fn negative_window_enables_deletions() {
        let w = RetentionWindow::from_signed(-25);
        assert!(w.deletions_enabled);
        assert_eq!(w.size, 25);
        assert_eq!(w.threshold_for(100), 75);
        assert!(!RetentionWindow::from_signed(25).deletions_enabled);
    }

    #[test]
    fn retention_only_moves_forward() {
        let mut r = Retention::default();
        assert_eq!(r.advance(50), 50);
        assert_eq!(r.advance(40), 50);
        assert_eq!(r.advance(70), 70);
    }
}
