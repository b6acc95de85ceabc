mod util;

use dyno_sieve::algs::communicator::Communicator;
use dyno_sieve::algs::distribute::distribute_batch;
use dyno_sieve::algs::merge::merge_updates;
use dyno_sieve::algs::query::{GraphSummary, degree, edge_count, local_degree, top_n_high_degree, vertex_count};
use dyno_sieve::algs::seed::{SourcePicker, highest_degree_source};
use dyno_sieve::algs::window::evict_and_synchronize;
use dyno_sieve::topology::vertex::VertexId;
use util::{on_ranks, shard_for, upd};

/// Vertex `v` gets `v` outgoing edges, timestamped `v * 10`.
fn star_batch() -> Vec<dyno_sieve::topology::edge::EdgeUpdate> {
    let mut b = Vec::new();
    for v in 1..=6u64 {
        for d in 1..=v {
            b.push(upd(v, d, 1, v as i64 * 10));
        }
    }
    b
}

#[test]
fn aggregates_match_on_every_rank() {
    let out = on_ranks(3, |comm| {
        let mut store = shard_for(&comm, 8);
        let input = if comm.rank() == 0 { star_batch() } else { Vec::new() };
        let mut mine = distribute_batch(&comm, store.partition(), 8, 0, input).unwrap();
        merge_updates(&mut store, &mut mine).unwrap();
        comm.barrier();

        let raw = local_degree(&store, VertexId::new(5));
        let d5 = degree(&store, VertexId::new(5), &comm).unwrap();
        let top = top_n_high_degree(&store, 3, &comm).unwrap();
        let best = highest_degree_source(&store, &comm).unwrap();
        let summary = GraphSummary::collect(&store, &comm).unwrap();

        let removed = evict_and_synchronize(&mut store, 45, &comm);
        let after = (vertex_count(&store, &comm).unwrap(), edge_count(&store, &comm).unwrap());
        (comm.rank(), raw, d5, top, best, summary, removed, after)
    });

    for (rank, raw, d5, top, best, summary, _, after) in &out {
        assert_eq!(*raw, if *rank == 2 { 5 } else { 0 });
        assert_eq!(*d5, 5);
        assert_eq!(
            top,
            &vec![(VertexId::new(6), 6), (VertexId::new(5), 5), (VertexId::new(4), 4)]
        );
        assert_eq!(*best, Some(VertexId::new(6)));
        assert_eq!(summary.pid, *rank);
        assert_eq!((summary.num_vertices, summary.num_edges), (6, 21));
        assert_eq!(*after, (2, 11));
    }
    let removed: usize = out.iter().map(|t| t.6).sum();
    assert_eq!(removed, 10);
}

#[test]
fn ingesting_new_edges_grows_counts_exactly() {
    let out = on_ranks(2, |comm| {
        let mut store = shard_for(&comm, 20);
        let mut counts = Vec::new();
        for round in 0..3u64 {
            let input = if comm.rank() == 0 {
                (1..=5).map(|i| upd(i + round * 5, 1, 1, 0)).collect()
            } else {
                Vec::new()
            };
            let mut mine = distribute_batch(&comm, store.partition(), 20, 0, input).unwrap();
            merge_updates(&mut store, &mut mine).unwrap();
            counts.push((vertex_count(&store, &comm).unwrap(), edge_count(&store, &comm).unwrap()));
        }
        counts
    });
    assert_eq!(out[0], vec![(5, 5), (10, 10), (15, 15)]);
    assert_eq!(out[0], out[1]);
}

#[test]
fn seed_picker_agrees_across_ranks() {
    let out = on_ranks(4, |comm| {
        let mut store = shard_for(&comm, 100);
        let input = if comm.rank() == 0 { star_batch() } else { Vec::new() };
        let mut mine = distribute_batch(&comm, store.partition(), 100, 0, input).unwrap();
        merge_updates(&mut store, &mut mine).unwrap();
        let mut picker = SourcePicker::default();
        let v = picker.next_source(&store, &comm).unwrap();
        (v, degree(&store, v, &comm).unwrap())
    });
    assert!(out.iter().all(|&x| x == out[0]));
    assert!(out[0].1 > 0);
}
