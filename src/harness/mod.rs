//! Benchmark harness: configuration, the per-rank graph handle and the
//! batch loop.

pub mod config;
pub mod dynamic_graph;
pub mod runner;

pub use config::{BenchArgs, BenchConfig, GraphConfig, SourceSelection};
pub use dynamic_graph::DynamicGraph;
pub use runner::{BatchReport, TrialReport, run_benchmark, run_trials};
