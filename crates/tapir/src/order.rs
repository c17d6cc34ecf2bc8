//! Crossing reduction: alternating median sweeps over the rank structure.
//!
//! Within-rank positions live in the cells' per-rank scratch slots, so the
//! stage never touches the hosting graph. The best ordering seen (by the
//! bilayer crossing count) wins.

use crate::model::HierarchyModel;

const MAX_ITERATIONS: usize = 24;
/// Stop after this many sweeps without improvement.
const PATIENCE: usize = 4;

/// Permutes each rank to reduce edge crossings. Returns the crossing count
/// of the ordering left in the model.
pub fn reduce_crossings(model: &mut HierarchyModel) -> usize {
    if model.ranks.len() < 2 {
        assign_positions(model);
        return 0;
    }

    assign_positions(model);
    let mut best_cc = count_crossings(model);
    let mut best_ranks = model.ranks.clone();
    let mut since_best = 0usize;

    for iteration in 0..MAX_ITERATIONS {
        if best_cc == 0 || since_best >= PATIENCE {
            break;
        }

        let max_rank = model.max_rank();
        if iteration % 2 == 0 {
            for layer in 1..=max_rank {
                median_sort(model, layer, true);
            }
        } else {
            for layer in (0..max_rank).rev() {
                median_sort(model, layer, false);
            }
        }

        let cc = count_crossings(model);
        if cc < best_cc {
            best_cc = cc;
            best_ranks = model.ranks.clone();
            since_best = 0;
        } else {
            since_best += 1;
        }
    }

    model.ranks = best_ranks;
    assign_positions(model);
    best_cc
}

/// Writes each cell's within-rank position into its scratch slot.
fn assign_positions(model: &mut HierarchyModel) {
    for layer in 0..model.ranks.len() {
        let cells = model.ranks[layer].clone();
        for (position, idx) in cells.into_iter().enumerate() {
            model.cells[idx].set_general_purpose_variable(layer as i32, position as i32);
        }
    }
}

/// Reorders one rank by the median position of its neighbors in the
/// adjacent, already-ordered rank. `downward` sweeps consult the layer
/// above, upward sweeps the layer below. Cells without neighbors keep their
/// current position.
fn median_sort(model: &mut HierarchyModel, layer: i32, downward: bool) {
    let cells = model.ranks[layer as usize].clone();
    let mut keyed: Vec<(f64, i32, usize)> = Vec::with_capacity(cells.len());

    for idx in cells {
        let current = model.cells[idx].general_purpose_variable(layer);
        let (neighbors, neighbor_layer) = if downward {
            (model.next_layer_connected_cells(idx, layer), layer - 1)
        } else {
            (model.previous_layer_connected_cells(idx, layer), layer + 1)
        };
        let mut positions: Vec<i32> = neighbors
            .into_iter()
            .map(|n| model.cells[n].general_purpose_variable(neighbor_layer))
            .collect();
        positions.sort_unstable();

        let median = if positions.is_empty() {
            current as f64
        } else if positions.len() % 2 == 1 {
            positions[positions.len() / 2] as f64
        } else {
            let mid = positions.len() / 2;
            (positions[mid - 1] + positions[mid]) as f64 / 2.0
        };
        keyed.push((median, current, idx));
    }

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let reordered: Vec<usize> = keyed.iter().map(|&(_, _, idx)| idx).collect();
    for (position, &idx) in reordered.iter().enumerate() {
        model.cells[idx].set_general_purpose_variable(layer, position as i32);
    }
    model.ranks[layer as usize] = reordered;
}

/// Total crossings between every adjacent rank pair, via the accumulator
/// tree bilayer count.
pub fn count_crossings(model: &mut HierarchyModel) -> usize {
    let mut total = 0usize;
    for layer in 0..model.max_rank() {
        total += bilayer_cross_count(model, layer);
    }
    total
}

fn bilayer_cross_count(model: &mut HierarchyModel, north_layer: i32) -> usize {
    let south_layer = north_layer + 1;
    let south_len = model.ranks[south_layer as usize].len();
    if south_len == 0 {
        return 0;
    }

    // South endpoint positions grouped by north order, sorted within each
    // north cell.
    let north = model.ranks[north_layer as usize].clone();
    let mut south_positions: Vec<usize> = Vec::new();
    for idx in north {
        let mut entries: Vec<usize> = model
            .previous_layer_connected_cells(idx, north_layer)
            .into_iter()
            .map(|n| model.cells[n].general_purpose_variable(south_layer) as usize)
            .collect();
        entries.sort_unstable();
        south_positions.extend(entries);
    }

    // Accumulator tree: count, for each endpoint, the endpoints already
    // inserted strictly to its right.
    let mut first_index: usize = 1;
    while first_index < south_len {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree = vec![0usize; tree_size];

    let mut cc = 0usize;
    for pos in south_positions {
        let mut index = pos + first_index;
        tree[index] += 1;
        while index > 0 {
            if index % 2 == 1 {
                cc += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += 1;
        }
    }
    cc
}
