//! `dynograph`: streaming dynamic-graph benchmark over a partitioned edge store.
//!
//! Runs either as an in-process group of `--local-ranks` threads or, with the
//! `mpi-support` feature and `--mpi`, as one rank of an MPI job. Per-batch
//! progress goes to stdout as JSON lines; diagnostics go to stderr.

use clap::Parser;
use dyno_sieve::algs::communicator::{Communicator, RayonComm};
use dyno_sieve::algs::partition::PartitionScheme;
use dyno_sieve::graph_error::DynoGraphError;
use dyno_sieve::harness::{BenchArgs, BenchConfig, GraphConfig, SourceSelection, run_benchmark};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dynograph",
    version,
    about = "Streaming dynamic-graph benchmark over a partitioned edge store"
)]
struct Cli {
    /// Space-separated analytics to run after every batch (`all` for every stage).
    #[arg(long, env = "DYNOGRAPH_ALG_NAMES", default_value = "all")]
    alg_names: String,

    /// Edge list (`src dst weight timestamp` per line) or packed `.bin` file.
    #[arg(long, env = "DYNOGRAPH_INPUT_PATH", value_name = "FILE")]
    input_path: PathBuf,

    /// Number of batches the edge stream is cut into.
    #[arg(long, env = "DYNOGRAPH_NUM_BATCHES", allow_negative_numbers = true)]
    num_batches: i64,

    /// Retention window in timestamp units; negative enables deletions.
    #[arg(long, env = "DYNOGRAPH_WINDOW_SIZE", allow_negative_numbers = true)]
    window_size: i64,

    /// Number of times the whole stream is replayed.
    #[arg(long, env = "DYNOGRAPH_NUM_TRIALS", default_value_t = 1, allow_negative_numbers = true)]
    num_trials: i64,

    /// Exclusive upper bound on vertex ids; derived from the data when omitted.
    #[arg(long, env = "DYNOGRAPH_MAX_VERTEX_ID", allow_negative_numbers = true)]
    max_vertex_id: Option<i64>,

    /// Vertex ownership layout: `cyclic` or `block`.
    #[arg(long, default_value = "cyclic")]
    partition: PartitionScheme,

    /// How traversal sources are chosen: `random` or `highest-degree`.
    #[arg(long, default_value = "random")]
    source_selection: SourceSelection,

    /// Seed of the source picker.
    #[arg(long, default_value_t = dyno_sieve::algs::seed::DEFAULT_SEED)]
    seed: u64,

    /// Bulk-load the first batch of each trial without duplicate detection.
    #[arg(long)]
    snapshot_first_batch: bool,

    /// Number of in-process ranks.
    #[arg(long, env = "DYNOGRAPH_LOCAL_RANKS", default_value_t = 1)]
    local_ranks: usize,

    /// Run as one rank of an MPI job instead of an in-process group.
    #[cfg(feature = "mpi-support")]
    #[arg(long)]
    mpi: bool,
}

impl From<Cli> for BenchArgs {
    fn from(cli: Cli) -> Self {
        BenchArgs {
            alg_names: cli.alg_names.split_whitespace().map(str::to_string).collect(),
            input_path: cli.input_path,
            num_batches: cli.num_batches,
            window_size: cli.window_size,
            num_trials: cli.num_trials,
            max_vertex_id: cli.max_vertex_id,
            graph: GraphConfig {
                partition: cli.partition,
                snapshot_first_batch: cli.snapshot_first_batch,
                source_selection: cli.source_selection,
                seed: cli.seed,
            },
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    #[cfg(feature = "mpi-support")]
    if cli.mpi {
        std::process::exit(run_mpi(cli));
    }

    let local_ranks = cli.local_ranks.max(1);
    let config = match BenchConfig::try_from(BenchArgs::from(cli)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(-1);
        }
    };
    let results = RayonComm::run(local_ranks, |comm| {
        let outcome = run_benchmark(&config, &comm, &mut std::io::stdout());
        report(&comm, outcome)
    });
    if results.iter().any(|ok| !ok) {
        std::process::exit(-1);
    }
}

/// Log a rank's failure; true on success.
fn report<C: Communicator, T>(comm: &C, outcome: Result<T, DynoGraphError>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(e) => {
            log::error!("rank {} failed: {e}", comm.rank());
            false
        }
    }
}

#[cfg(feature = "mpi-support")]
fn run_mpi(cli: Cli) -> i32 {
    use dyno_sieve::algs::communicator::MpiComm;

    let comm = match MpiComm::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return -1;
        }
    };
    let config = match BenchConfig::try_from(BenchArgs::from(cli)) {
        Ok(c) => c,
        Err(e) => {
            if comm.is_coordinator() {
                eprintln!("{e}");
            }
            return -1;
        }
    };
    let outcome = run_benchmark(&config, &comm, &mut std::io::stdout());
    if report(&comm, outcome) { 0 } else { -1 }
}
