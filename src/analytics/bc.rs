//! Brandes betweenness centrality (unweighted, directed).
//!
//! Every rank builds the replicated snapshot, runs the single-source
//! dependency accumulation for the sources it owns (in parallel with rayon),
//! and the per-rank centrality vectors are summed element-wise.

use crate::algs::collective::allreduce_vec;
use crate::algs::communicator::{Communicator, tags};
use crate::analytics::snapshot::GraphSnapshot;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;
use rayon::prelude::*;
use std::collections::VecDeque;

pub fn betweenness<C: Communicator>(
    store: &EdgeStore,
    comm: &C,
) -> Result<Vec<f64>, DynoGraphError> {
    let snap = GraphSnapshot::gather(store, comm)?;
    let n = snap.num_vertices();
    let sources: Vec<usize> = (1..n)
        .filter(|&s| snap.out_degree(s) > 0 && store.owns(VertexId::new(s as u64)))
        .collect();
    let local = betweenness_from(&snap, &sources);
    log::debug!(
        "rank {} accumulated betweenness from {} sources",
        comm.rank(),
        sources.len()
    );
    allreduce_vec(comm, tags::BC, local, |a, b| a + b)
}

/// Sum of dependencies contributed by `sources` on `snap`.
pub fn betweenness_from(snap: &GraphSnapshot, sources: &[usize]) -> Vec<f64> {
    let n = snap.num_vertices();
    sources
        .par_iter()
        .fold(
            || vec![0.0f64; n],
            |mut acc, &s| {
                accumulate(snap, s, &mut acc);
                acc
            },
        )
        .reduce(
            || vec![0.0f64; n],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        )
}

fn accumulate(snap: &GraphSnapshot, s: usize, centrality: &mut [f64]) {
    let n = snap.num_vertices();
    let mut order = Vec::new();
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    sigma[s] = 1.0;
    dist[s] = 0;

    let mut queue = VecDeque::from([s]);
    while let Some(v) = queue.pop_front() {
        order.push(v);
        for w in snap.neighbors(v) {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    for &w in order.iter().rev() {
        for &v in &preds[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
        if w != s {
            centrality[w] += delta[w];
        }
    }
}
