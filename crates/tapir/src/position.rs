//! Coordinate assignment: rank order plus spacing into abstract centers.
//!
//! Coordinates here are axis-abstract: `x` is the cross axis (within a
//! rank), `y` the primary axis (across ranks). The orchestrator maps them to
//! screen axes according to the configured orientation when committing.

use crate::model::{CellKind, HierarchyModel};
use crate::options::LayoutOptions;

/// Median alignment sweeps after the initial packing.
const REFINEMENT_PASSES: usize = 3;

/// Computes per-rank centers for every cell (nodes and the interior ranks of
/// long edges) from the ordering left by crossing reduction.
pub fn assign_coordinates(model: &mut HierarchyModel, options: &LayoutOptions) {
    if model.ranks.is_empty() {
        return;
    }

    initial_packing(model, options);
    for _ in 0..REFINEMENT_PASSES {
        for layer in 1..=model.max_rank() {
            median_align(model, layer, true, options);
        }
        for layer in (0..model.max_rank()).rev() {
            median_align(model, layer, false, options);
        }
    }
    assign_primary_axis(model, options);
}

/// Extent of a cell across the rank, honoring orientation. Edge segments are
/// as wide as the fan of parallel edges they carry.
pub(crate) fn cross_extent(model: &HierarchyModel, idx: usize, options: &LayoutOptions) -> f64 {
    match &model.cells[idx].kind {
        CellKind::Node(n) => match options.orientation {
            crate::options::Orientation::Vertical => n.width,
            crate::options::Orientation::Horizontal => n.height,
        },
        CellKind::Edge(e) => (e.edges.len() as f64 - 1.0) * options.parallel_edge_spacing,
    }
}

/// Extent of a cell along the primary axis.
pub(crate) fn primary_extent(model: &HierarchyModel, idx: usize, options: &LayoutOptions) -> f64 {
    match &model.cells[idx].kind {
        CellKind::Node(n) => match options.orientation {
            crate::options::Orientation::Vertical => n.height,
            crate::options::Orientation::Horizontal => n.width,
        },
        CellKind::Edge(_) => 0.0,
    }
}

/// Packs each rank left to right, then centers every rank on the widest one.
fn initial_packing(model: &mut HierarchyModel, options: &LayoutOptions) {
    let mut rank_widths: Vec<f64> = Vec::with_capacity(model.ranks.len());
    for layer in 0..model.ranks.len() {
        let cells = model.ranks[layer].clone();
        let mut cursor = 0.0;
        for (i, idx) in cells.iter().enumerate() {
            let w = cross_extent(model, *idx, options);
            model.cells[*idx].set_x(layer as i32, cursor + w / 2.0);
            cursor += w;
            if i + 1 < cells.len() {
                cursor += options.intra_cell_spacing;
            }
        }
        rank_widths.push(cursor);
    }

    let max_width = rank_widths.iter().copied().fold(0.0_f64, f64::max);
    for layer in 0..model.ranks.len() {
        let offset = (max_width - rank_widths[layer]) / 2.0;
        if offset == 0.0 {
            continue;
        }
        let cells = model.ranks[layer].clone();
        for idx in cells {
            let x = model.cells[idx].x(layer as i32);
            model.cells[idx].set_x(layer as i32, x + offset);
        }
    }
}

/// Pulls each cell toward the mean position of its neighbors in the
/// adjacent, already-aligned rank, preserving within-rank order and minimum
/// separation by a left-to-right greedy placement.
fn median_align(model: &mut HierarchyModel, layer: i32, downward: bool, options: &LayoutOptions) {
    let cells = model.ranks[layer as usize].clone();
    let mut desired: Vec<f64> = Vec::with_capacity(cells.len());

    for &idx in &cells {
        let (neighbors, neighbor_layer) = if downward {
            (model.next_layer_connected_cells(idx, layer), layer - 1)
        } else {
            (model.previous_layer_connected_cells(idx, layer), layer + 1)
        };
        if neighbors.is_empty() {
            desired.push(model.cells[idx].x(layer));
        } else {
            let sum: f64 = neighbors
                .iter()
                .map(|&n| model.cells[n].x(neighbor_layer))
                .sum();
            desired.push(sum / neighbors.len() as f64);
        }
    }

    let mut last_right = f64::NEG_INFINITY;
    for (i, &idx) in cells.iter().enumerate() {
        let w = cross_extent(model, idx, options);
        let min_center = if last_right == f64::NEG_INFINITY {
            f64::NEG_INFINITY
        } else {
            last_right + options.intra_cell_spacing + w / 2.0
        };
        let x = desired[i].max(min_center);
        model.cells[idx].set_x(layer, x);
        last_right = x + w / 2.0;
    }
}

/// Walks the ranks along the primary axis and records every cell's center
/// per occupied rank.
fn assign_primary_axis(model: &mut HierarchyModel, options: &LayoutOptions) {
    let mut cursor = 0.0;
    for layer in 0..model.ranks.len() {
        let cells = model.ranks[layer].clone();
        let extent = cells
            .iter()
            .map(|&idx| primary_extent(model, idx, options))
            .fold(0.0_f64, f64::max)
            .max(crate::model::MIN_CELL_EXTENT);

        let center = cursor + extent / 2.0;
        for idx in cells {
            model.cells[idx].set_y(layer as i32, center);
        }

        cursor += extent;
        if layer + 1 < model.ranks.len() {
            cursor += options.inter_rank_spacing;
        }
    }
}
