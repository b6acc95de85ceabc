//! Fixed-layout, little-endian wire types for batch routing and dataset files.

use crate::topology::edge::{Edge, EdgeUpdate};
use crate::topology::vertex::VertexId;
use bytemuck::{Pod, Zeroable};
use std::mem::{align_of, size_of};

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Number of records in the message that follows on the same tag.
///
/// 64-bit on the wire so that any `usize` length is carried exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireCount {
    pub n_le: u64,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }

    /// The announced count, or `None` when it does not fit this platform's `usize`.
    pub fn get(&self) -> Option<usize> {
        usize::try_from(u64::from_le(self.n_le)).ok()
    }
}

/// One edge record: `(src, dst, weight, timestamp)`, 4 × 64-bit LE.
///
/// Used both for routing updates between ranks and as the record layout of
/// binary dataset files. The merge-local `done` flag is not part of it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct WireEdge {
    pub src_le: u64,
    pub dst_le: u64,
    pub weight_le: i64,
    pub timestamp_le: i64,
}

impl WireEdge {
    pub const SIZE: usize = 32;

    pub fn new(src: u64, dst: u64, weight: i64, timestamp: i64) -> Self {
        Self {
            src_le: src.to_le(),
            dst_le: dst.to_le(),
            weight_le: weight.to_le(),
            timestamp_le: timestamp.to_le(),
        }
    }

    pub fn src(&self) -> u64 {
        u64::from_le(self.src_le)
    }
    pub fn dst(&self) -> u64 {
        u64::from_le(self.dst_le)
    }
    pub fn weight(&self) -> i64 {
        i64::from_le(self.weight_le)
    }
    pub fn timestamp(&self) -> i64 {
        i64::from_le(self.timestamp_le)
    }

    pub fn to_edge(&self) -> Edge {
        Edge {
            src: VertexId::new(self.src()),
            dst: VertexId::new(self.dst()),
            weight: self.weight(),
            timestamp: self.timestamp(),
        }
    }
}

impl From<&Edge> for WireEdge {
    fn from(e: &Edge) -> Self {
        WireEdge::new(e.src.get(), e.dst.get(), e.weight, e.timestamp)
    }
}

impl From<&EdgeUpdate> for WireEdge {
    fn from(u: &EdgeUpdate) -> Self {
        WireEdge::new(u.src.get(), u.dst.get(), u.weight, u.timestamp)
    }
}

impl From<WireEdge> for EdgeUpdate {
    fn from(w: WireEdge) -> Self {
        w.to_edge().into()
    }
}

/// `(vertex, degree)` pair for the high-degree gather.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireDegree {
    pub vertex_le: u64,
    pub degree_le: u64,
}

impl WireDegree {
    pub fn new(vertex: VertexId, degree: usize) -> Self {
        Self {
            vertex_le: vertex.get().to_le(),
            degree_le: (degree as u64).to_le(),
        }
    }
    pub fn vertex(&self) -> VertexId {
        VertexId::new(u64::from_le(self.vertex_le))
    }
    pub fn degree(&self) -> usize {
        u64::from_le(self.degree_le) as usize
    }
}

/// `(vertex, value)` pair used by traversals to exchange proposals.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WireVertexValue {
    pub vertex_le: u64,
    pub value_le: i64,
}

impl WireVertexValue {
    pub fn new(vertex: VertexId, value: i64) -> Self {
        Self {
            vertex_le: vertex.get().to_le(),
            value_le: value.to_le(),
        }
    }
    pub fn vertex(&self) -> VertexId {
        VertexId::new(u64::from_le(self.vertex_le))
    }
    pub fn value(&self) -> i64 {
        i64::from_le(self.value_le)
    }
}

// ===== Compile-time sanity checks =========================================

const _: () = {
    assert!(size_of::<WireCount>() == 8);
    assert!(size_of::<WireEdge>() == WireEdge::SIZE);
    assert!(align_of::<WireEdge>() == 8);
    assert!(size_of::<WireDegree>() == 16);
    assert!(size_of::<WireVertexValue>() == 16);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_edge() {
        let v = vec![WireEdge::new(1, 2, -5, 100), WireEdge::new(3, 4, 1, 50)];
        let bytes: Vec<u8> = cast_slice(&v).to_vec();
        assert_eq!(bytes.len(), 2 * WireEdge::SIZE);
        let mut out = vec![WireEdge::zeroed(); v.len()];
        cast_slice_mut(&mut out).copy_from_slice(&bytes);
        assert_eq!(out[0].to_edge(), Edge::new(1, 2, -5, 100));
        assert_eq!(out[1].timestamp(), 50);
    }

    #[test]
    fn update_conversion_drops_done_flag() {
        let mut u = EdgeUpdate::new(7, 8, 2, 3);
        u.mark_done();
        let back: EdgeUpdate = WireEdge::from(&u).into();
        assert!(!back.is_done());
        assert_eq!(back.key(), u.key());
    }

    #[test]
    fn count_is_not_truncated() {
        let big = u32::MAX as usize + 7;
        let bytes = cast_slice(std::slice::from_ref(&WireCount::new(big))).to_vec();
        assert_eq!(bytes.len(), 8);
        let mut back = WireCount::new(0);
        cast_slice_mut(std::slice::from_mut(&mut back)).copy_from_slice(&bytes);
        assert_eq!(back.get(), Some(big));
    }
}
