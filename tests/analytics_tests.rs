//! Distributed analytics must give the same answer as a single rank.

mod util;

use dyno_sieve::algs::communicator::{Communicator, NoComm};
use dyno_sieve::algs::distribute::distribute_batch;
use dyno_sieve::algs::merge::merge_updates;
use dyno_sieve::analytics::{Algorithm, AlgorithmOutput, VertexValues, run_algorithm};
use dyno_sieve::topology::edge::EdgeUpdate;
use dyno_sieve::topology::vertex::VertexId;
use util::{on_ranks, shard_for, upd};

const N: u64 = 24;

/// Two rings joined by a bridge, an isolated pair, and varied weights.
fn graph() -> Vec<EdgeUpdate> {
    let mut b = Vec::new();
    for i in 1..=8u64 {
        b.push(upd(i, i % 8 + 1, (i as i64 % 3) + 1, i as i64));
    }
    for i in 9..=16u64 {
        b.push(upd(i, (i - 8) % 8 + 9, 2, i as i64));
    }
    b.push(upd(4, 12, 1, 50));
    b.push(upd(12, 4, 7, 51));
    b.push(upd(20, 21, 1, 60));
    b
}

fn run_on<C: Communicator>(comm: &C, alg: Algorithm) -> AlgorithmOutput {
    let mut store = shard_for(comm, N);
    let input = if comm.rank() == 0 { graph() } else { Vec::new() };
    let mut mine = distribute_batch(comm, store.partition(), N, 0, input).unwrap();
    merge_updates(&mut store, &mut mine).unwrap();
    comm.barrier();
    run_algorithm(alg, &store, &[VertexId::new(1)], comm).unwrap()
}

fn close(a: &VertexValues, b: &VertexValues) -> bool {
    match (a, b) {
        (VertexValues::Int(x), VertexValues::Int(y)) => x == y,
        (VertexValues::Float(x), VertexValues::Float(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| (p - q).abs() < 1e-9)
        }
        _ => false,
    }
}

#[test]
fn every_algorithm_matches_the_serial_result() {
    for alg in Algorithm::ALL {
        let serial = run_on(&NoComm, alg);
        for ranks in [2, 3] {
            let outs = on_ranks(ranks, |comm| run_on(&comm, alg));
            for out in &outs {
                assert_eq!(out.algorithm, alg);
                assert!(
                    close(&out.values, &serial.values),
                    "{alg} on {ranks} ranks diverged"
                );
            }
        }
    }
}

#[test]
fn traversals_cross_the_bridge() {
    let bfs = run_on(&NoComm, Algorithm::Bfs);
    let level = bfs.values.as_int().unwrap();
    assert_eq!(level[1], 0);
    assert_eq!(level[4], 3);
    assert_eq!(level[12], 4);
    assert_eq!(level[20], -1);

    let cc = run_on(&NoComm, Algorithm::Cc);
    let label = cc.values.as_int().unwrap();
    assert!((1..=16).all(|v| label[v] == 1));
    assert_eq!((label[20], label[21], label[22]), (20, 20, 22));
}

#[test]
fn pagerank_mass_is_conserved_across_ranks() {
    let outs = on_ranks(3, |comm| run_on(&comm, Algorithm::Pagerank));
    let ranks = outs[0].values.as_float().unwrap();
    let total: f64 = ranks.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
}
