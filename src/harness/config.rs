//! Benchmark configuration and its validation.

use crate::algs::partition::PartitionScheme;
use crate::algs::seed::DEFAULT_SEED;
use crate::algs::window::RetentionWindow;
use crate::analytics::Algorithm;
use crate::graph_error::DynoGraphError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How traversal sources are chosen before each batch's analytics.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSelection {
    /// Seeded pseudo-random candidates, first with nonzero out-degree wins.
    #[default]
    Random,
    /// The cluster-wide highest-degree vertex.
    HighestDegree,
}

impl std::str::FromStr for SourceSelection {
    type Err = DynoGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SourceSelection::Random),
            "highest-degree" => Ok(SourceSelection::HighestDegree),
            other => Err(DynoGraphError::InvalidArgument {
                name: "source_selection",
                reason: format!("unknown source selection `{other}`"),
            }),
        }
    }
}

/// Knobs of one [`DynamicGraph`](crate::harness::DynamicGraph) instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub partition: PartitionScheme,
    /// Load the first batch of each trial without duplicate detection.
    pub snapshot_first_batch: bool,
    pub source_selection: SourceSelection,
    /// Seed of the source picker; identical on every rank.
    pub seed: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            partition: PartitionScheme::default(),
            snapshot_first_batch: false,
            source_selection: SourceSelection::default(),
            seed: DEFAULT_SEED,
        }
    }
}

/// Unvalidated arguments, with the signed numbers the command line accepts.
#[derive(Clone, Debug, Default)]
pub struct BenchArgs {
    pub alg_names: Vec<String>,
    pub input_path: PathBuf,
    pub num_batches: i64,
    pub window_size: i64,
    pub num_trials: i64,
    pub max_vertex_id: Option<i64>,
    pub graph: GraphConfig,
}

/// A validated benchmark run description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub algorithms: Vec<Algorithm>,
    pub input_path: PathBuf,
    pub num_batches: usize,
    pub window: RetentionWindow,
    pub num_trials: usize,
    pub max_vertex_id: Option<u64>,
    pub graph: GraphConfig,
}

fn positive(name: &'static str, value: i64) -> Result<u64, DynoGraphError> {
    if value <= 0 {
        return Err(DynoGraphError::InvalidArgument {
            name,
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(value as u64)
}

impl TryFrom<BenchArgs> for BenchConfig {
    type Error = DynoGraphError;

    fn try_from(args: BenchArgs) -> Result<Self, Self::Error> {
        let algorithms = Algorithm::parse_list(&args.alg_names)?;
        let num_batches = positive("num_batches", args.num_batches)? as usize;
        if args.window_size == 0 {
            return Err(DynoGraphError::InvalidArgument {
                name: "window_size",
                reason: "must be non-zero".into(),
            });
        }
        let window = RetentionWindow::from_signed(args.window_size);
        let num_trials = positive("num_trials", args.num_trials)? as usize;
        let max_vertex_id = args
            .max_vertex_id
            .map(|m| positive("max_vertex_id", m))
            .transpose()?;
        Ok(BenchConfig {
            algorithms,
            input_path: args.input_path,
            num_batches,
            window,
            num_trials,
            max_vertex_id,
            graph: args.graph,
        })
    }
}
