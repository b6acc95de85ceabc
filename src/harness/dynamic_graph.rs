//! The per-rank handle on the distributed dynamic graph.
//!
//! A [`DynamicGraph`] owns this rank's shard and borrows the communicator for
//! its lifetime. Methods are collective unless marked local: all ranks must
//! call them in the same order.

use crate::algs::communicator::Communicator;
use crate::algs::distribute::exchange_batch;
use crate::algs::merge::{IngestMode, MergeStats, ingest};
use crate::algs::query::{self, GraphSummary};
use crate::algs::seed::{SourcePicker, highest_degree_source};
use crate::algs::window::{Retention, evict_and_synchronize};
use crate::analytics::{Algorithm, AlgorithmOutput, run_algorithm};
use crate::data::dataset::Batch;
use crate::graph_error::DynoGraphError;
use crate::harness::config::{GraphConfig, SourceSelection};
use crate::topology::edge::EdgeUpdate;
use crate::topology::shard::EdgeStore;
use crate::topology::vertex::VertexId;

pub struct DynamicGraph<'c, C: Communicator> {
    comm: &'c C,
    store: EdgeStore,
    config: GraphConfig,
    retention: Retention,
    picker: SourcePicker,
    batches_inserted: usize,
}

impl<'c, C: Communicator> DynamicGraph<'c, C> {
    /// An empty graph for ids in `[0, max_vertex_id)`, partitioned over the
    /// communicator's ranks. Local; no communication.
    pub fn new(comm: &'c C, max_vertex_id: u64, config: GraphConfig) -> Self {
        let partition = config.partition.build(comm.size(), max_vertex_id);
        Self {
            comm,
            store: EdgeStore::new(comm.rank(), partition, max_vertex_id),
            config,
            retention: Retention::default(),
            picker: SourcePicker::new(config.seed),
            batches_inserted: 0,
        }
    }

    pub fn store(&self) -> &EdgeStore {
        &self.store
    }

    pub fn comm(&self) -> &'c C {
        self.comm
    }

    pub fn retention_threshold(&self) -> i64 {
        self.retention.threshold()
    }

    /// Hook invoked before a batch is applied. Local.
    pub fn before_batch(&mut self, batch: &Batch<'_>, threshold: i64) {
        log::debug!(
            "rank {} preparing batch {} ({} local updates, threshold {threshold})",
            self.comm.rank(),
            batch.index,
            batch.len()
        );
    }

    /// Drop every edge older than `threshold` on every rank. The retention
    /// threshold never moves backwards, so a stale threshold is a no-op.
    pub fn evict_older_than(&mut self, threshold: i64) -> usize {
        let threshold = self.retention.advance(threshold);
        evict_and_synchronize(&mut self.store, threshold, self.comm)
    }

    /// Route this rank's slice of `batch` to the owners and merge it.
    ///
    /// The first batch is bulk-loaded when the configuration asks for it.
    pub fn insert_batch(&mut self, batch: &Batch<'_>) -> Result<MergeStats, DynoGraphError> {
        let local: Vec<EdgeUpdate> = batch.edges.iter().copied().map(EdgeUpdate::from).collect();
        let mut mine = exchange_batch(
            self.comm,
            self.store.partition(),
            self.store.max_vertex_id(),
            local,
        )?;
        let mode = if self.batches_inserted == 0 && self.config.snapshot_first_batch {
            IngestMode::Snapshot
        } else {
            IngestMode::Incremental
        };
        let stats = ingest(&mut self.store, &mut mine, mode)?;
        self.batches_inserted += 1;
        self.comm.barrier();
        Ok(stats)
    }

    /// Source vertices for a traversal, chosen identically on every rank.
    pub fn pick_sources(&mut self) -> Result<Vec<VertexId>, DynoGraphError> {
        match self.config.source_selection {
            SourceSelection::Random => Ok(vec![self.picker.next_source(&self.store, self.comm)?]),
            SourceSelection::HighestDegree => highest_degree_source(&self.store, self.comm)?
                .map(|v| vec![v])
                .ok_or(DynoGraphError::SeedSelectionExhausted { tries: 1 }),
        }
    }

    /// Run one analytics stage, picking sources first when it needs them.
    pub fn update_alg(&mut self, alg: Algorithm) -> Result<AlgorithmOutput, DynoGraphError> {
        let sources = if alg.needs_sources() {
            self.pick_sources()?
        } else {
            Vec::new()
        };
        let out = run_algorithm(alg, &self.store, &sources, self.comm)?;
        self.comm.barrier();
        Ok(out)
    }

    /// Cluster-wide out-degree of `v`.
    pub fn out_degree(&self, v: VertexId) -> Result<u64, DynoGraphError> {
        query::degree(&self.store, v, self.comm)
    }

    pub fn num_vertices(&self) -> Result<u64, DynoGraphError> {
        query::vertex_count(&self.store, self.comm)
    }

    pub fn num_edges(&self) -> Result<u64, DynoGraphError> {
        query::edge_count(&self.store, self.comm)
    }

    pub fn high_degree_vertices(&self, n: usize) -> Result<Vec<(VertexId, usize)>, DynoGraphError> {
        query::top_n_high_degree(&self.store, n, self.comm)
    }

    pub fn summary(&self) -> Result<GraphSummary, DynoGraphError> {
        GraphSummary::collect(&self.store, self.comm)
    }
}
