//! Edge records: persisted edges, their mutable attributes, and the
//! ephemeral updates that create or modify them.

use crate::topology::vertex::VertexId;
use serde::{Deserialize, Serialize};

/// `(src, dst)` key of a directed edge.
pub type EdgeKey = (VertexId, VertexId);

/// Mutable attributes carried by a stored edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Accumulated weight.
    pub weight: i64,
    /// Most recent timestamp seen for this edge.
    pub timestamp: i64,
}

impl EdgeAttrs {
    pub fn new(weight: i64, timestamp: i64) -> Self {
        Self { weight, timestamp }
    }

    /// Fold one update into these attributes: weights add, timestamps keep the max.
    ///
    /// The weight saturates at `i64::MIN`/`i64::MAX` instead of wrapping.
    #[inline]
    pub fn absorb(&mut self, weight_delta: i64, timestamp: i64) {
        self.weight = self.weight.saturating_add(weight_delta);
        self.timestamp = self.timestamp.max(timestamp);
    }
}

/// A timestamped, weighted directed edge as it appears in a dataset.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub src: VertexId,
    pub dst: VertexId,
    pub weight: i64,
    pub timestamp: i64,
}

impl Edge {
    pub fn new(src: u64, dst: u64, weight: i64, timestamp: i64) -> Self {
        Self {
            src: VertexId::new(src),
            dst: VertexId::new(dst),
            weight,
            timestamp,
        }
    }

    #[inline]
    pub fn key(&self) -> EdgeKey {
        (self.src, self.dst)
    }

    #[inline]
    pub fn attrs(&self) -> EdgeAttrs {
        EdgeAttrs::new(self.weight, self.timestamp)
    }
}

/// One incoming edge event of a batch.
///
/// The `done` flag is merge-local bookkeeping: it is set once the update has
/// been folded into an edge and is never stored or transmitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdgeUpdate {
    pub src: VertexId,
    pub dst: VertexId,
    pub weight: i64,
    pub timestamp: i64,
    done: bool,
}

impl EdgeUpdate {
    pub fn new(src: u64, dst: u64, weight: i64, timestamp: i64) -> Self {
        Edge::new(src, dst, weight, timestamp).into()
    }

    #[inline]
    pub fn key(&self) -> EdgeKey {
        (self.src, self.dst)
    }

    #[inline]
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn as_edge(&self) -> Edge {
        Edge {
            src: self.src,
            dst: self.dst,
            weight: self.weight,
            timestamp: self.timestamp,
        }
    }
}

impl From<Edge> for EdgeUpdate {
    fn from(e: Edge) -> Self {
        Self {
            src: e.src,
            dst: e.dst,
            weight: e.weight,
            timestamp: e.timestamp,
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_sums_weight_and_keeps_latest_timestamp() {
        let mut a = EdgeAttrs::new(5, 100);
        a.absorb(3, 90);
        assert_eq!(a, EdgeAttrs::new(8, 100));
        a.absorb(-2, 120);
        assert_eq!(a, EdgeAttrs::new(6, 120));
    }

    #[test]
    fn weight_saturates_instead_of_wrapping() {
        let mut a = EdgeAttrs::new(i64::MAX - 1, 0);
        a.absorb(5, 1);
        assert_eq!(a.weight, i64::MAX);
        let mut b = EdgeAttrs::new(i64::MIN + 1, 0);
        b.absorb(-5, 1);
        assert_eq!(b.weight, i64::MIN);
    }

    #[test]
    fn update_starts_not_done() {
        let mut u = EdgeUpdate::new(1, 2, 1, 1);
        assert!(!u.is_done());
        u.mark_done();
        assert!(u.is_done());
        assert_eq!(u.as_edge(), Edge::new(1, 2, 1, 1));
    }
}
