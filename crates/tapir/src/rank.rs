//! Layering: longest-path rank assignment over the acyclic internal model.

use crate::model::{CellKind, HierarchyModel};

/// Assigns each node the length of the longest path from a root, fills the
/// per-rank cell arrays and records every edge's rank span.
///
/// Must run after cycle removal; edges are assumed to form a DAG. After this
/// stage every internal edge satisfies `rank(target) > rank(source)`, and an
/// edge spanning ranks `r..r'` occupies the interior ranks `r+1..r'-1` in
/// the rank structure.
pub fn assign_ranks(model: &mut HierarchyModel) {
    model.clear_adjacency_caches();

    let cell_count = model.cells.len();
    let mut rank = vec![0i32; cell_count];
    let mut indegree = vec![0usize; cell_count];
    let mut node_total = 0usize;

    for idx in model.node_indices() {
        let node = model.cells[idx].as_node().expect("node index");
        indegree[idx] = node.connects_as_target.len();
        node_total += 1;
    }

    if node_total == 0 {
        model.ranks = Vec::new();
        return;
    }

    // Kahn's scheme with max-propagation computes longest paths from the
    // roots in one sweep; arena order keeps it deterministic.
    let mut queue: std::collections::VecDeque<usize> = model
        .node_indices()
        .filter(|&i| indegree[i] == 0)
        .collect();

    let mut processed = 0usize;
    while let Some(v) = queue.pop_front() {
        processed += 1;
        let outgoing = model.cells[v]
            .as_node()
            .map(|n| n.connects_as_source.clone())
            .unwrap_or_default();
        for e in outgoing {
            let target = match &model.cells[e].kind {
                CellKind::Edge(edge) => edge.target,
                CellKind::Node(_) => continue,
            };
            rank[target] = rank[target].max(rank[v] + 1);
            indegree[target] -= 1;
            if indegree[target] == 0 {
                queue.push_back(target);
            }
        }
    }
    debug_assert_eq!(processed, node_total, "ranking requires an acyclic model");

    let max_rank = model.node_indices().map(|i| rank[i]).max().unwrap_or(0);
    let mut ranks: Vec<Vec<usize>> = vec![Vec::new(); (max_rank + 1) as usize];

    let node_indices: Vec<usize> = model.node_indices().collect();
    for idx in node_indices {
        let r = rank[idx];
        let cell = &mut model.cells[idx];
        cell.min_rank = r;
        cell.max_rank = r;
        ranks[r as usize].push(idx);
    }

    let edge_indices: Vec<usize> = model.edge_indices().collect();
    for idx in edge_indices {
        let (source, target) = match &model.cells[idx].kind {
            CellKind::Edge(e) => (e.source, e.target),
            CellKind::Node(_) => continue,
        };
        let min = rank[source];
        let max = rank[target];
        debug_assert!(max > min, "edges must point strictly downward in rank");
        let cell = &mut model.cells[idx];
        cell.min_rank = min;
        cell.max_rank = max;
        cell.resize_span((max - min - 1) as usize);
        for layer in min + 1..max {
            ranks[layer as usize].push(idx);
        }
    }

    model.ranks = ranks;
}
