mod util;

use dyno_sieve::harness::{BenchArgs, BenchConfig, GraphConfig, run_benchmark};
use std::io::Write;
use util::on_ranks;

fn dataset_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(f, "% a small two-community graph").unwrap();
    for i in 1..=30u64 {
        let (src, dst) = (i % 10 + 1, (i * 3) % 10 + 1);
        writeln!(f, "{src} {dst} {} {}", i % 4 + 1, i * 10).unwrap();
    }
    f.flush().unwrap();
    f
}

fn config(path: &std::path::Path, window_size: i64) -> BenchConfig {
    BenchConfig::try_from(BenchArgs {
        alg_names: vec!["all".into()],
        input_path: path.to_path_buf(),
        num_batches: 3,
        window_size,
        num_trials: 1,
        max_vertex_id: None,
        graph: GraphConfig::default(),
    })
    .unwrap()
}

/// `(num_vertices, num_edges)` after each batch, as seen by each rank.
fn run(ranks: usize, cfg: &BenchConfig) -> Vec<Vec<(u64, u64)>> {
    on_ranks(ranks, |comm| {
        let mut out = Vec::new();
        let reports = run_benchmark(cfg, &comm, &mut out).unwrap();
        let lines = String::from_utf8(out).unwrap().lines().count();
        assert_eq!(lines, 3);
        reports[0]
            .batches
            .iter()
            .map(|b| (b.summary.num_vertices, b.summary.num_edges))
            .collect()
    })
}

#[test]
fn rank_count_does_not_change_the_graph() {
    let file = dataset_file();
    for window in [1000, -100] {
        let cfg = config(file.path(), window);
        let serial = run(1, &cfg);
        for ranks in [2, 3] {
            let got = run(ranks, &cfg);
            assert!(got.iter().all(|per_rank| per_rank == &serial[0]), "window {window}");
        }
    }
}

#[test]
fn growing_graph_never_shrinks_without_deletions() {
    let file = dataset_file();
    let got = run(2, &config(file.path(), 1000));
    let edges: Vec<u64> = got[0].iter().map(|&(_, e)| e).collect();
    assert!(edges.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn missing_input_fails_on_every_rank() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir.path().join("nope.txt"), 10);
    let out = on_ranks(3, |comm| run_benchmark(&cfg, &comm, &mut Vec::new()).is_err());
    assert_eq!(out, vec![true, true, true]);
}

#[test]
fn invalid_arguments_are_rejected_before_running() {
    let args = BenchArgs {
        alg_names: vec!["bfs".into()],
        input_path: "x.txt".into(),
        num_batches: 0,
        window_size: 10,
        num_trials: 1,
        max_vertex_id: None,
        graph: GraphConfig::default(),
    };
    assert!(BenchConfig::try_from(args).is_err());
}
