//! Graph data model: vertex ids, edges and the per-rank edge store.

pub mod edge;
pub mod shard;
pub mod vertex;

pub use edge::{Edge, EdgeAttrs, EdgeKey, EdgeUpdate};
pub use shard::EdgeStore;
pub use vertex::VertexId;
