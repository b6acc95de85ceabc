//! Distributed algorithms over the partitioned edge store, plus the
//! communication layer they run on.

pub mod collective;
pub mod communicator;
pub mod distribute;
pub mod merge;
pub mod partition;
pub mod query;
pub mod seed;
pub mod window;
pub mod wire;

pub use distribute::{distribute_batch, exchange_batch, split_by_owner};
pub use merge::{IngestMode, MergeStats, ingest};
pub use partition::{Partition, PartitionScheme};
pub use query::{GraphSummary, degree, edge_count, top_n_high_degree, vertex_count};
pub use window::{Retention, RetentionWindow, evict_and_synchronize, evict_older_than};
