//! Power-iteration PageRank over the distributed store.
//!
//! Ranks are replicated. Each iteration every rank scatters the rank mass of
//! its owned vertices along their out-edges into a local contribution vector;
//! the vectors are summed element-wise across ranks. Mass held by owned
//! vertices without out-edges (dangling) is summed separately and spread
//! uniformly.

use crate::algs::collective::{allreduce_vec, sum};
use crate::algs::communicator::{Communicator, tags};
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use rayon::prelude::*;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PageRankOptions {
    pub iterations: usize,
    pub damping: f64,
}

impl Default for PageRankOptions {
    fn default() -> Self {
        Self {
            iterations: 20,
            damping: 0.85,
        }
    }
}

/// PageRank over vertex ids `1..max_vertex_id`; slot 0 stays 0.
pub fn pagerank<C: Communicator>(
    store: &EdgeStore,
    opts: &PageRankOptions,
    comm: &C,
) -> Result<Vec<f64>, DynoGraphError> {
    let n = store.max_vertex_id() as usize;
    if n <= 1 {
        return Ok(vec![0.0; n]);
    }
    let nv = (n - 1) as f64;
    let owned: Vec<_> = store
        .partition()
        .owned_vertices(store.rank(), store.max_vertex_id())
        .collect();

    let mut rank = vec![1.0 / nv; n];
    rank[0] = 0.0;
    for it in 0..opts.iterations {
        let mut contrib = vec![0.0f64; n];
        let mut dangling = 0.0f64;
        for &u in &owned {
            let deg = store.out_degree(u);
            if deg == 0 {
                dangling += rank[u.index()];
                continue;
            }
            let share = rank[u.index()] / deg as f64;
            for (v, _) in store.out_edges(u) {
                contrib[v.index()] += share;
            }
        }
        let contrib = allreduce_vec(comm, tags::PAGERANK, contrib, |a, b| a + b)?;
        let dangling = sum(comm, tags::PAGERANK.offset(4), dangling)?;

        let base = (1.0 - opts.damping) / nv + opts.damping * dangling / nv;
        rank.par_iter_mut()
            .zip(contrib.par_iter())
            .skip(1)
            .for_each(|(r, &c)| *r = base + opts.damping * c);
        log::trace!("pagerank iteration {it}: dangling mass {dangling:.6}");
    }
    Ok(rank)
}
