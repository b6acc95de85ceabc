#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dyno-sieve
//!
//! dyno-sieve is a distributed dynamic-graph store and benchmark harness. A
//! fixed group of ranks ingests a timestamped edge stream in batches, keeps a
//! sliding window of recent edges, answers cluster-wide aggregate queries and
//! runs graph analytics after every batch.
//!
//! ## Features
//! - Vertex-ownership partitioning (cyclic or block), computed locally on every rank
//! - Per-rank edge store keyed by `(src, dst)` with duplicate-aware merging
//!   (weights add, timestamps keep the maximum)
//! - Batch routing to owners, sliding-window eviction and aggregate queries
//! - Pluggable communication backends (serial, in-process threads, MPI)
//! - Analytics stages: BFS, SSSP, connected components, colouring, PageRank
//!   and betweenness centrality
//!
//! ## Explicit communication context
//!
//! Nothing reads the rank or group size from global state: every component
//! takes a [`Communicator`](algs::communicator::Communicator) by reference.
//! All collectives must be entered by every rank in the same order.
//!
//! ## Determinism
//!
//! Source selection uses a `SmallRng` with a fixed seed, identical on every
//! rank, so all ranks agree on traversal sources without exchanging them.
//!
//! ## Usage
//! Enable MPI with the `mpi-support` feature:
//!
//! ```toml
//! [dependencies]
//! dyno-sieve = { version = "0.3", features = ["mpi-support"] }
//! ```

pub mod algs;
pub mod analytics;
pub mod data;
pub mod graph_error;
pub mod harness;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::Communicator;
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{NoComm, RayonComm};
    pub use crate::algs::merge::IngestMode;
    pub use crate::algs::partition::{Partition, PartitionScheme};
    pub use crate::algs::query::GraphSummary;
    pub use crate::algs::window::RetentionWindow;
    pub use crate::analytics::{Algorithm, run_algorithm};
    pub use crate::data::dataset::{Batch, Dataset, distribute_dataset};
    pub use crate::graph_error::DynoGraphError;
    pub use crate::harness::{BenchConfig, DynamicGraph, GraphConfig, run_benchmark};
    pub use crate::topology::{Edge, EdgeStore, EdgeUpdate, VertexId};
}
