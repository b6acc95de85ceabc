//! Edge-stream datasets split into batches.
//!
//! # Supported formats
//! - Text edge lists: one `src dst weight timestamp` record per line, all
//!   integers. Blank lines and lines starting with `#` or `%` are skipped.
//! - Binary (`.bin` extension): packed little-endian [`WireEdge`] records.
//!
//! # Batching
//! The stream is cut into `num_batches` contiguous slices of equal length;
//! the remainder goes to the last batch. Every batch records the largest
//! timestamp it contains, from which the retention threshold is derived.

use crate::algs::collective::{broadcast_scalar, broadcast_vec, scatter_vec};
use crate::algs::communicator::{Communicator, tags};
use crate::algs::wire::WireEdge;
use crate::graph_error::DynoGraphError;
use crate::topology::edge::Edge;
use std::io::{BufRead, BufReader, Read, Write};
use std::ops::Range;
use std::path::Path;

/// One batch of a dataset, borrowed from it.
#[derive(Copy, Clone, Debug)]
pub struct Batch<'a> {
    pub index: usize,
    pub edges: &'a [Edge],
    /// Largest timestamp in the batch across the whole cluster.
    pub max_timestamp: i64,
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// `max_timestamp - window`, saturating.
    pub fn threshold(&self, window: i64) -> i64 {
        self.max_timestamp.saturating_sub(window)
    }
}

/// An edge stream plus its batch boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    edges: Vec<Edge>,
    batches: Vec<Range<usize>>,
    batch_max_ts: Vec<i64>,
    max_vertex_id: u64,
}

impl Dataset {
    /// Build a dataset from a full edge stream.
    ///
    /// `max_vertex_id` is the exclusive id bound. Without one the bound is
    /// `max(src, dst) + 1`; with one, any endpoint at or past it is rejected.
    pub fn from_edges(
        edges: Vec<Edge>,
        num_batches: usize,
        max_vertex_id: Option<u64>,
    ) -> Result<Self, DynoGraphError> {
        if num_batches == 0 {
            return Err(DynoGraphError::InvalidArgument {
                name: "num_batches",
                reason: "must be positive".into(),
            });
        }
        if edges.len() < num_batches {
            log::warn!(
                "{} edges split into {num_batches} batches; some batches will be empty",
                edges.len()
            );
        }
        let max_vertex_id = match max_vertex_id {
            Some(bound) => {
                if let Some(vertex) = edges
                    .iter()
                    .flat_map(|e| [e.src, e.dst])
                    .find(|v| v.get() >= bound)
                {
                    return Err(DynoGraphError::VertexOutOfRange {
                        vertex,
                        max_vertex_id: bound,
                    });
                }
                bound
            }
            None => edges
                .iter()
                .map(|e| e.src.get().max(e.dst.get()) + 1)
                .max()
                .unwrap_or(1),
        };

        let per_batch = edges.len() / num_batches;
        let batches: Vec<Range<usize>> = (0..num_batches)
            .map(|i| {
                let start = i * per_batch;
                let end = if i + 1 == num_batches {
                    edges.len()
                } else {
                    start + per_batch
                };
                start..end
            })
            .collect();
        let batch_max_ts = batches
            .iter()
            .map(|r| max_timestamp(&edges[r.clone()]))
            .collect();
        Ok(Self {
            edges,
            batches,
            batch_max_ts,
            max_vertex_id,
        })
    }

    /// Reassemble a rank-local dataset from per-batch pieces. The maxima are
    /// cluster-wide values, not recomputed from the local pieces.
    pub fn from_batches(
        pieces: Vec<Vec<Edge>>,
        batch_max_ts: Vec<i64>,
        max_vertex_id: u64,
    ) -> Result<Self, DynoGraphError> {
        if pieces.len() != batch_max_ts.len() {
            return Err(DynoGraphError::CollectiveLayout(format!(
                "{} batch pieces but {} batch timestamps",
                pieces.len(),
                batch_max_ts.len()
            )));
        }
        let mut edges = Vec::with_capacity(pieces.iter().map(Vec::len).sum());
        let mut batches = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let start = edges.len();
            edges.extend(piece);
            batches.push(start..edges.len());
        }
        Ok(Self {
            edges,
            batches,
            batch_max_ts,
            max_vertex_id,
        })
    }

    /// Load a dataset from disk, choosing the format by extension.
    pub fn load(
        path: impl AsRef<Path>,
        num_batches: usize,
        max_vertex_id: Option<u64>,
    ) -> Result<Self, DynoGraphError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let edges = if path.extension().is_some_and(|e| e == "bin") {
            read_binary(file)?
        } else {
            read_text(BufReader::new(file))?
        };
        log::info!(
            "loaded {} edges from {} into {num_batches} batches",
            edges.len(),
            path.display()
        );
        Self::from_edges(edges, num_batches, max_vertex_id)
    }

    /// Write the edges as packed binary records, loadable as `.bin`.
    pub fn save_binary(&self, mut out: impl Write) -> Result<(), DynoGraphError> {
        let wire: Vec<WireEdge> = self.edges.iter().map(WireEdge::from).collect();
        out.write_all(bytemuck::cast_slice(&wire))?;
        Ok(())
    }

    pub fn num_batches(&self) -> usize {
        self.batches.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn max_vertex_id(&self) -> u64 {
        self.max_vertex_id
    }

    pub fn batch_max_timestamps(&self) -> &[i64] {
        &self.batch_max_ts
    }

    pub fn batch(&self, index: usize) -> Result<Batch<'_>, DynoGraphError> {
        let range = self
            .batches
            .get(index)
            .ok_or(DynoGraphError::BatchOutOfRange {
                index,
                num_batches: self.batches.len(),
            })?;
        Ok(Batch {
            index,
            edges: &self.edges[range.clone()],
            max_timestamp: self.batch_max_ts[index],
        })
    }

    pub fn batches(&self) -> impl Iterator<Item = Batch<'_>> + '_ {
        self.batches
            .iter()
            .zip(&self.batch_max_ts)
            .enumerate()
            .map(|(index, (range, &max_timestamp))| Batch {
                index,
                edges: &self.edges[range.clone()],
                max_timestamp,
            })
    }

    /// Retention threshold for batch `index` under a window of `window`.
    pub fn threshold(&self, index: usize, window: i64) -> Result<i64, DynoGraphError> {
        Ok(self.batch(index)?.threshold(window))
    }
}

fn max_timestamp(edges: &[Edge]) -> i64 {
    edges.iter().map(|e| e.timestamp).max().unwrap_or(i64::MIN)
}

fn parse_field<T: std::str::FromStr>(
    raw: Option<&str>,
    what: &str,
    line: usize,
) -> Result<T, DynoGraphError> {
    let raw = raw.ok_or_else(|| DynoGraphError::DatasetParse {
        line,
        reason: format!("missing {what}"),
    })?;
    raw.parse::<T>().map_err(|_| DynoGraphError::DatasetParse {
        line,
        reason: format!("invalid {what}: {raw}"),
    })
}

/// Parse a text edge list. Line numbers in errors are 1-based.
pub fn read_text<R: BufRead>(reader: R) -> Result<Vec<Edge>, DynoGraphError> {
    let mut edges = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('%') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let src: u64 = parse_field(parts.next(), "source", lineno)?;
        let dst: u64 = parse_field(parts.next(), "destination", lineno)?;
        let weight: i64 = parse_field(parts.next(), "weight", lineno)?;
        let timestamp: i64 = parse_field(parts.next(), "timestamp", lineno)?;
        if parts.next().is_some() {
            return Err(DynoGraphError::DatasetParse {
                line: lineno,
                reason: "trailing fields".into(),
            });
        }
        if src == 0 || dst == 0 {
            return Err(DynoGraphError::DatasetParse {
                line: lineno,
                reason: "vertex id 0 is reserved".into(),
            });
        }
        edges.push(Edge::new(src, dst, weight, timestamp));
    }
    Ok(edges)
}

/// Read packed [`WireEdge`] records. Errors report the 1-based record number.
pub fn read_binary<R: Read>(mut reader: R) -> Result<Vec<Edge>, DynoGraphError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    if raw.len() % WireEdge::SIZE != 0 {
        return Err(DynoGraphError::DatasetParse {
            line: raw.len() / WireEdge::SIZE + 1,
            reason: format!(
                "file length {} is not a multiple of {} bytes",
                raw.len(),
                WireEdge::SIZE
            ),
        });
    }
    raw.chunks_exact(WireEdge::SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            let edge = bytemuck::pod_read_unaligned::<WireEdge>(chunk).to_edge();
            if edge.src.get() == 0 || edge.dst.get() == 0 {
                Err(DynoGraphError::DatasetParse {
                    line: i + 1,
                    reason: "vertex id 0 is reserved".into(),
                })
            } else {
                Ok(edge)
            }
        })
        .collect()
}

/// Split `edges` into `parts` contiguous pieces of `len / parts` edges, the
/// remainder going to the last piece.
pub fn split_even(edges: &[Edge], parts: usize) -> Vec<Vec<Edge>> {
    let parts = parts.max(1);
    let per = edges.len() / parts;
    (0..parts)
        .map(|i| {
            let start = i * per;
            let end = if i + 1 == parts { edges.len() } else { start + per };
            edges[start..end].to_vec()
        })
        .collect()
}

/// Hand every rank its slice of every batch.
///
/// The root passes `Some(dataset)`; other ranks pass `None`. The root
/// broadcasts `max_vertex_id` and the per-batch maximum timestamps, then
/// scatters each batch in `size` near-equal contiguous pieces. A root that
/// failed to load passes `None` too, which releases the peers with an error
/// instead of leaving them blocked.
///
/// This slicing is by position within the batch and only balances load;
/// routing to vertex owners happens later, per batch, during ingestion.
pub fn distribute_dataset<C: Communicator>(
    comm: &C,
    root_dataset: Option<Dataset>,
    num_batches: usize,
) -> Result<Dataset, DynoGraphError> {
    const ROOT: usize = 0;
    let is_root = comm.rank() == ROOT;

    let announced = match (&root_dataset, is_root) {
        (Some(ds), true) => ds.max_vertex_id(),
        _ => 0,
    };
    let max_vertex_id = broadcast_scalar(comm, tags::DATASET_META, ROOT, announced)?;
    if max_vertex_id == 0 {
        return Err(DynoGraphError::CollectiveLayout(
            "coordinator has no dataset to distribute".into(),
        ));
    }

    let ts = match (&root_dataset, is_root) {
        (Some(ds), true) => ds.batch_max_timestamps().to_vec(),
        _ => Vec::new(),
    };
    let batch_max_ts = broadcast_vec(comm, tags::DATASET_META.offset(1), ROOT, ts)?;
    if batch_max_ts.len() != num_batches {
        return Err(DynoGraphError::CollectiveLayout(format!(
            "coordinator announced {} batches, expected {num_batches}",
            batch_max_ts.len()
        )));
    }

    let mut pieces = Vec::with_capacity(num_batches);
    for index in 0..num_batches {
        let outgoing: Vec<Vec<WireEdge>> = match (&root_dataset, is_root) {
            (Some(ds), true) => split_even(ds.batch(index)?.edges, comm.size())
                .into_iter()
                .map(|p| p.iter().map(WireEdge::from).collect())
                .collect(),
            _ => Vec::new(),
        };
        let mine = scatter_vec(comm, tags::DATASET_SCATTER, ROOT, outgoing)?;
        pieces.push(mine.iter().map(WireEdge::to_edge).collect());
    }

    let local = Dataset::from_batches(pieces, batch_max_ts, max_vertex_id)?;
    log::debug!(
        "rank {} holds {} of the dataset's edges",
        comm.rank(),
        local.num_edges()
    );
    Ok(local)
}
