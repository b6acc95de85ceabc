//! The benchmark driver: dataset distribution once, then the per-batch
//! evict / ingest / analyse / report loop for every trial.

use crate::algs::communicator::Communicator;
use crate::algs::query::GraphSummary;
use crate::data::dataset::{Dataset, distribute_dataset};
use crate::graph_error::DynoGraphError;
use crate::harness::config::BenchConfig;
use crate::harness::dynamic_graph::DynamicGraph;
use serde::Serialize;
use std::io::Write;
use std::time::{Duration, Instant};

/// Timings and counts of one batch.
#[derive(Clone, Debug, Serialize)]
pub struct BatchReport {
    pub batch: usize,
    pub threshold: Option<i64>,
    pub evicted_local: usize,
    pub inserted_local: usize,
    pub summary: GraphSummary,
    pub evict_time: Duration,
    pub insert_time: Duration,
    pub analytics_time: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub struct TrialReport {
    pub trial: usize,
    pub batches: Vec<BatchReport>,
}

/// Load the dataset on rank 0, distribute it, and run every trial.
///
/// Progress lines go to `out` on every rank.
pub fn run_benchmark<C, W>(
    config: &BenchConfig,
    comm: &C,
    out: &mut W,
) -> Result<Vec<TrialReport>, DynoGraphError>
where
    C: Communicator,
    W: Write,
{
    let mut load_error = None;
    let root_dataset = if comm.is_coordinator() {
        match Dataset::load(&config.input_path, config.num_batches, config.max_vertex_id) {
            Ok(ds) => Some(ds),
            Err(e) => {
                load_error = Some(e);
                None
            }
        }
    } else {
        None
    };
    let local = distribute_dataset(comm, root_dataset, config.num_batches);
    if let Some(e) = load_error {
        return Err(e);
    }
    run_trials(config, comm, &local?, out)
}

/// Run every trial over an already distributed rank-local dataset.
pub fn run_trials<C, W>(
    config: &BenchConfig,
    comm: &C,
    dataset: &Dataset,
    out: &mut W,
) -> Result<Vec<TrialReport>, DynoGraphError>
where
    C: Communicator,
    W: Write,
{
    let mut reports = Vec::with_capacity(config.num_trials);
    for trial in 0..config.num_trials {
        if comm.is_coordinator() {
            log::info!("trial {trial}: {} batches", dataset.num_batches());
        }
        let mut graph = DynamicGraph::new(comm, dataset.max_vertex_id(), config.graph);
        let mut batches = Vec::with_capacity(dataset.num_batches());
        for batch in dataset.batches() {
            let threshold = config
                .window
                .deletions_enabled
                .then(|| batch.threshold(config.window.size));
            graph.before_batch(&batch, threshold.unwrap_or(i64::MIN));

            let t = Instant::now();
            let evicted_local = threshold.map_or(0, |th| graph.evict_older_than(th));
            let evict_time = t.elapsed();

            let t = Instant::now();
            let stats = graph.insert_batch(&batch)?;
            let insert_time = t.elapsed();

            let t = Instant::now();
            for &alg in &config.algorithms {
                graph.update_alg(alg)?;
            }
            let analytics_time = t.elapsed();

            let summary = graph.summary()?;
            let mut line = summary.to_json_line()?;
            line.push('\n');
            out.write_all(line.as_bytes())?;
            out.flush()?;

            if comm.is_coordinator() {
                log::info!(
                    "batch {}: evict {:?}, insert {:?}, analytics {:?}",
                    batch.index,
                    evict_time,
                    insert_time,
                    analytics_time
                );
            }
            batches.push(BatchReport {
                batch: batch.index,
                threshold,
                evicted_local,
                inserted_local: stats.inserted_edges,
                summary,
                evict_time,
                insert_time,
                analytics_time,
            });
        }
        reports.push(TrialReport { trial, batches });
    }
    Ok(reports)
}
