//! The public layout entry point.
//!
//! `HierarchicalLayout::execute` gathers the cells under a parent container,
//! splits them into weakly-connected components, runs the four stages (cycle
//! removal, layering, crossing reduction, coordinate assignment) per
//! component over a freshly built hierarchy model, packs the components and
//! writes all geometry back to the hosting graph in one change batch.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use tapir_graph::{CellId, GraphModel, Point, Rect};

use crate::error::Result;
use crate::model::{CellKind, HierarchyModel};
use crate::options::{LayoutOptions, Orientation};
use crate::{acyclic, order, position, rank};

/// Hierarchical (layered) layout over a [`GraphModel`].
#[derive(Debug, Clone, Default)]
pub struct HierarchicalLayout {
    pub options: LayoutOptions,
}

/// Summary of one layout execution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutReport {
    /// Weakly-connected components laid out independently.
    pub components: usize,
    /// Internal edges inverted by cycle removal.
    pub inverted_edges: usize,
    /// Self-loop edges skipped by the layout.
    pub self_loops: Vec<CellId>,
}

impl HierarchicalLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Lays out every visible vertex and edge under `parent` (the model root
    /// when `None`). An empty container is a no-op success. All geometry
    /// writes happen in a single transactional batch; if any write fails,
    /// nothing is committed.
    pub fn execute(
        &self,
        graph: &mut GraphModel,
        parent: Option<CellId>,
    ) -> Result<LayoutReport> {
        let mut vertices: Vec<CellId> = Vec::new();
        let mut edges: Vec<CellId> = Vec::new();
        let mut skipped_edges: Vec<CellId> = Vec::new();

        for &cell in graph.children(parent) {
            if graph.is_vertex(cell) {
                if graph.is_visible(cell) {
                    vertices.push(cell);
                }
            } else if graph.is_edge(cell) {
                edges.push(cell);
            }
        }

        let in_scope: FxHashMap<CellId, usize> = vertices
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        // An edge participates only when visible and spanning two distinct
        // in-scope vertices; everything else is skipped (and optionally gets
        // its stale waypoints reset). Self-loops are reported but never laid
        // out.
        let mut layout_edges: Vec<CellId> = Vec::new();
        let mut self_loops: Vec<CellId> = Vec::new();
        for &e in &edges {
            if !graph.is_visible(e) {
                skipped_edges.push(e);
                continue;
            }
            match graph.terminals(e) {
                Some((s, t)) if s == t => {
                    self_loops.push(e);
                    skipped_edges.push(e);
                }
                Some((s, t)) if in_scope.contains_key(&s) && in_scope.contains_key(&t) => {
                    layout_edges.push(e);
                }
                _ => skipped_edges.push(e),
            }
        }

        debug!(
            vertices = vertices.len(),
            edges = layout_edges.len(),
            skipped = skipped_edges.len(),
            "hierarchical layout starting"
        );

        if vertices.is_empty() {
            return Ok(LayoutReport::default());
        }

        let components = connected_components(&vertices, &layout_edges, graph, &in_scope);
        let mut report = LayoutReport {
            components: components.len(),
            self_loops,
            ..Default::default()
        };

        let mut models: Vec<HierarchyModel> = Vec::with_capacity(components.len());
        for (i, component) in components.iter().enumerate() {
            let mut model = HierarchyModel::build(graph, component, &layout_edges);
            let inverted = acyclic::remove_cycles(&mut model);
            rank::assign_ranks(&mut model);
            let crossings = order::reduce_crossings(&mut model);
            position::assign_coordinates(&mut model, &self.options);

            trace!(
                component = i,
                nodes = component.len(),
                ranks = model.ranks.len(),
                inverted,
                crossings,
                "component laid out"
            );

            report.inverted_edges += inverted;
            models.push(model);
        }

        let base = self.base_origin(graph, &vertices);
        self.commit(graph, &models, &skipped_edges, base)?;

        debug!(
            components = report.components,
            inverted = report.inverted_edges,
            "hierarchical layout committed"
        );
        Ok(report)
    }

    /// Origin the finished layout is anchored to: (0, 0) when
    /// `move_to_origin` is set, otherwise the pre-layout bounding box origin
    /// of the affected vertices (which keeps repeated runs stable).
    fn base_origin(&self, graph: &GraphModel, vertices: &[CellId]) -> Point {
        if self.options.move_to_origin {
            return Point::new(0.0, 0.0);
        }
        let mut base = Point::new(f64::INFINITY, f64::INFINITY);
        for &v in vertices {
            if let Some(g) = graph.geometry(v) {
                base.x = base.x.min(g.x);
                base.y = base.y.min(g.y);
            }
        }
        if !base.x.is_finite() || !base.y.is_finite() {
            return Point::new(0.0, 0.0);
        }
        base
    }

    fn commit(
        &self,
        graph: &mut GraphModel,
        models: &[HierarchyModel],
        skipped_edges: &[CellId],
        base: Point,
    ) -> Result<()> {
        let opts = &self.options;

        // Component packing: stack along the primary axis, one inter-rank
        // gap between bounding boxes.
        let mut shifts: Vec<(f64, f64)> = Vec::with_capacity(models.len());
        let mut primary_cursor = 0.0;
        for model in models {
            let (min_x, min_y, _max_x, max_y) = bounds(model, opts);
            shifts.push((-min_x, primary_cursor - min_y));
            primary_cursor += (max_y - min_y) + opts.inter_rank_spacing;
        }

        let to_screen = |cross: f64, primary: f64| -> Point {
            match opts.orientation {
                Orientation::Vertical => Point::new(base.x + cross, base.y + primary),
                Orientation::Horizontal => Point::new(base.x + primary, base.y + cross),
            }
        };

        let mut update = graph.begin_update();

        for (model, &(shift_x, shift_y)) in models.iter().zip(&shifts) {
            for cell in &model.cells {
                match &cell.kind {
                    CellKind::Node(node) => {
                        let layer = cell.min_rank;
                        let center =
                            to_screen(cell.x(layer) + shift_x, cell.y(layer) + shift_y);
                        update.set_geometry(
                            node.vertex,
                            Rect::new(
                                center.x - node.width / 2.0,
                                center.y - node.height / 2.0,
                                node.width,
                                node.height,
                            ),
                        );
                    }
                    CellKind::Edge(edge) => {
                        // Interior chain, ordered from the internal source
                        // side; reversal restores external direction.
                        let mut chain: Vec<(f64, f64)> = (cell.min_rank + 1..cell.max_rank)
                            .map(|layer| (cell.x(layer) + shift_x, cell.y(layer) + shift_y))
                            .collect();
                        if edge.is_reversed {
                            chain.reverse();
                        }

                        // Adjacent-rank parallels get a synthetic midpoint so
                        // each can carry its own lateral offset.
                        if chain.is_empty() && edge.edges.len() > 1 {
                            let s = &model.cells[edge.source];
                            let t = &model.cells[edge.target];
                            chain.push((
                                (s.x(s.min_rank) + t.x(t.min_rank)) / 2.0 + shift_x,
                                (s.y(s.min_rank) + t.y(t.min_rank)) / 2.0 + shift_y,
                            ));
                        }

                        let fan = edge.edges.len() as f64;
                        for (k, &external) in edge.edges.iter().enumerate() {
                            let offset =
                                (k as f64 - (fan - 1.0) / 2.0) * opts.parallel_edge_spacing;
                            let points: Vec<Point> = chain
                                .iter()
                                .map(|&(cross, primary)| to_screen(cross + offset, primary))
                                .collect();
                            update.set_points(external, points);
                            if opts.disable_edge_style {
                                update.set_style(external, None);
                            }
                        }
                    }
                }
            }
        }

        if opts.reset_edges {
            for &e in skipped_edges {
                update.clear_points(e);
            }
        }

        update.commit()?;
        Ok(())
    }
}

/// Abstract-coordinate bounding box of a laid-out component.
fn bounds(model: &HierarchyModel, options: &LayoutOptions) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for (idx, cell) in model.cells.iter().enumerate() {
        let layers: Vec<i32> = if cell.is_vertex() {
            vec![cell.min_rank]
        } else {
            (cell.min_rank + 1..cell.max_rank).collect()
        };
        let half_cross = position::cross_extent(model, idx, options) / 2.0;
        let half_primary = position::primary_extent(model, idx, options) / 2.0;
        for layer in layers {
            min_x = min_x.min(cell.x(layer) - half_cross);
            max_x = max_x.max(cell.x(layer) + half_cross);
            min_y = min_y.min(cell.y(layer) - half_primary);
            max_y = max_y.max(cell.y(layer) + half_primary);
        }
    }

    if !min_x.is_finite() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    (min_x, min_y, max_x, max_y)
}

/// Splits the vertex set into weakly-connected components, each keeping the
/// original child order.
fn connected_components(
    vertices: &[CellId],
    edges: &[CellId],
    graph: &GraphModel,
    in_scope: &FxHashMap<CellId, usize>,
) -> Vec<Vec<CellId>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); vertices.len()];
    for &e in edges {
        if let Some((s, t)) = graph.terminals(e) {
            if let (Some(&a), Some(&b)) = (in_scope.get(&s), in_scope.get(&t)) {
                adjacency[a].push(b);
                adjacency[b].push(a);
            }
        }
    }

    let mut component_of: Vec<Option<usize>> = vec![None; vertices.len()];
    let mut count = 0usize;
    for start in 0..vertices.len() {
        if component_of[start].is_some() {
            continue;
        }
        let id = count;
        count += 1;
        let mut queue = std::collections::VecDeque::from([start]);
        component_of[start] = Some(id);
        while let Some(v) = queue.pop_front() {
            for &w in &adjacency[v] {
                if component_of[w].is_none() {
                    component_of[w] = Some(id);
                    queue.push_back(w);
                }
            }
        }
    }

    let mut components: Vec<Vec<CellId>> = vec![Vec::new(); count];
    for (i, &v) in vertices.iter().enumerate() {
        if let Some(id) = component_of[i] {
            components[id].push(v);
        }
    }
    components
}
