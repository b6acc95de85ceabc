//! DynoGraphError: unified error type for dyno-sieve public APIs
//!
//! Every fallible operation in the library returns this type. The benchmark
//! harness decides which variants are fatal; the library itself never exits.

use crate::topology::vertex::VertexId;
use thiserror::Error;

/// Unified error type for dyno-sieve operations.
#[derive(Debug, Error)]
pub enum DynoGraphError {
    /// An algorithm name that no analytics stage answers to.
    #[error("Algorithm {0} not implemented")]
    UnknownAlgorithm(String),
    /// A numeric or structural configuration value was rejected.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
    /// A worker was asked to hold an edge whose source it does not own.
    #[error("Ownership violation: rank {rank} asked to store edge from vertex {src} owned by rank {owner}")]
    OwnershipViolation {
        src: VertexId,
        owner: usize,
        rank: usize,
    },
    /// A vertex id outside `1..max_vertex_id`.
    #[error("Vertex {vertex} out of range (must be non-zero and < {max_vertex_id})")]
    VertexOutOfRange {
        vertex: VertexId,
        max_vertex_id: u64,
    },
    /// Another rank rejected its part of a collective batch.
    #[error("Batch rejected by rank {rank}")]
    PeerRejected { rank: usize },
    /// Point-to-point or collective communication with a peer failed.
    #[error("Communication error with rank {neighbor}: {source}")]
    CommError {
        neighbor: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A received buffer had an unexpected length.
    #[error("Buffer size mismatch from rank {neighbor}: expected {expected} bytes, got {got}")]
    BufferSizeMismatch {
        neighbor: usize,
        expected: usize,
        got: usize,
    },
    /// Root-side input did not match the communicator layout.
    #[error("Collective layout error: {0}")]
    CollectiveLayout(String),
    /// The dataset could not be parsed.
    #[error("Dataset parse error at line {line}: {reason}")]
    DatasetParse { line: usize, reason: String },
    /// A batch index past the end of the dataset.
    #[error("Batch {index} out of range (dataset has {num_batches} batches)")]
    BatchOutOfRange { index: usize, num_batches: usize },
    /// Source selection never found a vertex with outgoing edges.
    #[error("No vertex with non-zero out-degree found after {tries} candidates")]
    SeedSelectionExhausted { tries: usize },
    /// Underlying I/O failure (dataset files, progress output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure serializing a progress record.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DynoGraphError {
    /// True for errors caused by user input rather than a runtime failure.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DynoGraphError::UnknownAlgorithm(_) | DynoGraphError::InvalidArgument { .. }
        )
    }
}
