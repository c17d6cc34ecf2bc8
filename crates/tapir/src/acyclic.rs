//! Cycle removal: invert back edges until the internal DAG is acyclic.
//!
//! Edges are never removed; inverting preserves their identity so the commit
//! stage can still route every wrapped external edge, drawn flipped.

use crate::model::{CellKind, HierarchyModel};

/// Inverts every edge whose traversal would revisit a node on the current
/// DFS stack. Returns the number of inverted edges.
///
/// Roots are cells with no incoming edges; when a component is one big cycle
/// the node with the highest out-degree minus in-degree is taken instead,
/// first-encountered order breaking ties. The exact inversion set is an
/// implementation-defined deterministic policy; callers may only rely on the
/// postcondition that the model is acyclic.
pub fn remove_cycles(model: &mut HierarchyModel) -> usize {
    let cell_count = model.cells.len();
    let mut visited = vec![false; cell_count];
    let mut on_stack = vec![false; cell_count];
    let mut inverted = 0usize;

    let roots = find_roots(model);
    for root in roots {
        dfs(model, root, &mut visited, &mut on_stack, &mut inverted);
    }
    // Nodes unreachable from any root (cycle-only clusters) seed their own
    // traversals in arena order.
    for idx in 0..cell_count {
        if model.cells[idx].is_vertex() && !visited[idx] {
            dfs(model, idx, &mut visited, &mut on_stack, &mut inverted);
        }
    }

    inverted
}

fn find_roots(model: &HierarchyModel) -> Vec<usize> {
    let mut roots: Vec<usize> = model
        .node_indices()
        .filter(|&i| {
            model.cells[i]
                .as_node()
                .is_some_and(|n| n.connects_as_target.is_empty())
        })
        .collect();

    if roots.is_empty() {
        // Pure cycle: start from the most source-like node.
        let best = model.node_indices().max_by_key(|&i| {
            let node = model.cells[i].as_node().expect("node index");
            let diff = node.connects_as_source.len() as i64 - node.connects_as_target.len() as i64;
            // max_by_key keeps the last max; negate the index to prefer the
            // first-encountered node on ties.
            (diff, std::cmp::Reverse(i))
        });
        roots.extend(best);
    }

    roots
}

fn dfs(
    model: &mut HierarchyModel,
    start: usize,
    visited: &mut [bool],
    on_stack: &mut [bool],
    inverted: &mut usize,
) {
    if visited[start] {
        return;
    }

    // Frames hold a snapshot of the outgoing edges so in-place inversion
    // cannot disturb the iteration.
    let mut stack: Vec<(usize, Vec<usize>, usize)> = Vec::new();
    visited[start] = true;
    on_stack[start] = true;
    stack.push((start, outgoing(model, start), 0));

    loop {
        let Some(frame) = stack.last_mut() else {
            break;
        };
        if frame.2 >= frame.1.len() {
            on_stack[frame.0] = false;
            stack.pop();
            continue;
        }
        let edge_idx = frame.1[frame.2];
        frame.2 += 1;

        let target = match &model.cells[edge_idx].kind {
            CellKind::Edge(e) => e.target,
            CellKind::Node(_) => continue,
        };

        if on_stack[target] {
            model.invert_edge(edge_idx);
            *inverted += 1;
        } else if !visited[target] {
            visited[target] = true;
            on_stack[target] = true;
            stack.push((target, outgoing(model, target), 0));
        }
    }
}

fn outgoing(model: &HierarchyModel, node: usize) -> Vec<usize> {
    model.cells[node]
        .as_node()
        .map(|n| n.connects_as_source.clone())
        .unwrap_or_default()
}
