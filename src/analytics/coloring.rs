//! Greedy graph colouring.
//!
//! Runs on the replicated snapshot, so every rank computes the same colouring
//! without further communication. Direction is ignored; vertices are coloured
//! in ascending id order with the smallest colour unused by their
//! already-coloured neighbours. Isolated vertices get colour 0.

use crate::analytics::snapshot::GraphSnapshot;

pub fn greedy_coloring(snap: &GraphSnapshot) -> Vec<i64> {
    let adj = snap.undirected();
    let mut color = vec![-1i64; snap.num_vertices()];
    let mut taken: Vec<bool> = Vec::new();
    for v in 0..snap.num_vertices() {
        taken.clear();
        taken.resize(adj[v].len() + 1, false);
        for &u in &adj[v] {
            let c = color[u];
            if c >= 0 && (c as usize) < taken.len() {
                taken[c as usize] = true;
            }
        }
        color[v] = taken.iter().position(|&t| !t).unwrap_or(0) as i64;
    }
    let used = color.iter().max().map_or(0, |&c| c + 1);
    log::debug!("greedy colouring used {used} colours");
    color
}
