//! Analytics run against the distributed store after every batch.
//!
//! Every algorithm is read-only with respect to the shard and synchronizes
//! internally, so all ranks return identical per-vertex results. Per-vertex
//! arrays are replicated and indexed by vertex id (`0..max_vertex_id`; slot 0
//! is never a valid vertex).

pub mod bc;
pub mod bfs;
pub mod cc;
pub mod coloring;
pub mod pagerank;
pub mod snapshot;
pub mod sssp;

use crate::algs::collective::allgather_vec;
use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::wire::WireVertexValue;
use crate::graph_error::DynoGraphError;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use snapshot::GraphSnapshot;

/// The named analytics stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Bfs,
    Cc,
    Gc,
    Sssp,
    Pagerank,
    Bc,
}

impl Algorithm {
    /// What `all` expands to, in execution order.
    pub const ALL: [Algorithm; 6] = [
        Algorithm::Bfs,
        Algorithm::Cc,
        Algorithm::Gc,
        Algorithm::Sssp,
        Algorithm::Pagerank,
        Algorithm::Bc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Cc => "cc",
            Algorithm::Gc => "gc",
            Algorithm::Sssp => "sssp",
            Algorithm::Pagerank => "pagerank",
            Algorithm::Bc => "bc",
        }
    }

    /// Traversals need source vertices picked before they run.
    pub fn needs_sources(self) -> bool {
        matches!(self, Algorithm::Bfs | Algorithm::Sssp)
    }

    /// Parse a list of names, expanding `all` in place. Duplicates are kept.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Algorithm>, DynoGraphError> {
        let mut out = Vec::new();
        for name in names {
            match name.as_ref() {
                "all" => out.extend(Algorithm::ALL),
                other => out.push(other.parse()?),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DynoGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| DynoGraphError::UnknownAlgorithm(s.to_string()))
    }
}

/// Per-vertex results of one algorithm run, indexed by vertex id.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexValues {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl VertexValues {
    pub fn len(&self) -> usize {
        match self {
            VertexValues::Int(v) => v.len(),
            VertexValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_int(&self) -> Option<&[i64]> {
        match self {
            VertexValues::Int(v) => Some(v),
            VertexValues::Float(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f64]> {
        match self {
            VertexValues::Float(v) => Some(v),
            VertexValues::Int(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmOutput {
    pub algorithm: Algorithm,
    pub values: VertexValues,
}

/// Run `alg` over the distributed graph. Collective.
///
/// `sources` is required (non-empty) for traversals and ignored otherwise.
pub fn run_algorithm<C: Communicator>(
    alg: Algorithm,
    store: &EdgeStore,
    sources: &[VertexId],
    comm: &C,
) -> Result<AlgorithmOutput, DynoGraphError> {
    if alg.needs_sources() && sources.is_empty() {
        return Err(DynoGraphError::InvalidArgument {
            name: "sources",
            reason: format!("{alg} needs at least one source vertex"),
        });
    }
    log::info!("rank {} running {alg}", comm.rank());
    let values = match alg {
        Algorithm::Bfs => VertexValues::Int(bfs::bfs(store, sources, comm)?),
        Algorithm::Sssp => VertexValues::Int(sssp::sssp(store, sources, comm)?),
        Algorithm::Cc => VertexValues::Int(cc::connected_components(store, comm)?),
        Algorithm::Gc => {
            let snap = GraphSnapshot::gather(store, comm)?;
            VertexValues::Int(coloring::greedy_coloring(&snap))
        }
        Algorithm::Pagerank => VertexValues::Float(pagerank::pagerank(
            store,
            &pagerank::PageRankOptions::default(),
            comm,
        )?),
        Algorithm::Bc => VertexValues::Float(bc::betweenness(store, comm)?),
    };
    Ok(AlgorithmOutput {
        algorithm: alg,
        values,
    })
}

/// All-gather `(vertex, value)` proposals from every rank, flattened in rank order.
pub(crate) fn exchange_proposals<C: Communicator>(
    comm: &C,
    tag: CommTag,
    local: &[(VertexId, i64)],
) -> Result<Vec<(VertexId, i64)>, DynoGraphError> {
    let wire: Vec<WireVertexValue> = local
        .iter()
        .map(|&(v, x)| WireVertexValue::new(v, x))
        .collect();
    Ok(allgather_vec(comm, tag, wire)?
        .into_iter()
        .flatten()
        .map(|w| (w.vertex(), w.value()))
        .collect())
}
