//! Data module: edge-stream datasets and their distribution.

pub mod dataset;

pub use dataset::{Batch, Dataset, distribute_dataset};
