//! `VertexId`: a strong, zero-cost handle for graph vertices
//!
//! Vertices are dense integers in `[0, max_vertex_id)`. Id 0 exists in the
//! range (every rank sizes its structures for it) but is never a valid edge
//! endpoint; ingestion rejects it.

use std::fmt;

/// Dense vertex identifier.
///
/// # Memory layout
/// This type is `repr(transparent)` over `u64`, so slices of it can be cast
/// to bytes for the wire without copying.
#[derive(
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    serde::Serialize,
    serde::Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[repr(transparent)]
pub struct VertexId(u64);

impl VertexId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        VertexId(raw)
    }

    /// Returns the raw integer id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Index into dense per-vertex arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True when the id may appear as an edge endpoint in a graph of
    /// `max_vertex_id` vertices.
    #[inline]
    pub const fn is_valid_endpoint(self, max_vertex_id: u64) -> bool {
        self.0 > 0 && self.0 < max_vertex_id
    }
}

impl From<u64> for VertexId {
    fn from(raw: u64) -> Self {
        VertexId(raw)
    }
}

impl fmt::Debug for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VertexId").field(&self.0).finish()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
