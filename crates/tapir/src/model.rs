//! Internal hierarchy model: the DAG the layout stages operate on.
//!
//! The model wraps the hosting graph's vertices and edges in its own cells,
//! held in a flat arena and addressed by [`CellIdx`]. Parallel external edges
//! between the same ordered vertex pair collapse into one internal edge. An
//! edge spanning more than one rank is not split into dummy nodes; instead it
//! occupies every interior rank itself and reports itself as the connected
//! cell there (see [`HierarchyModel::next_layer_connected_cells`]), which
//! lets the ordering and positioning stages treat a long edge like a chain of
//! one-cell-wide nodes.
//!
//! A model is built fresh from the hosting graph for every layout execution
//! and discarded afterwards; nothing here survives a pass.

use rustc_hash::FxHashMap;
use tapir_graph::{CellId, GraphModel};

/// Index of a cell in a [`HierarchyModel`] arena.
pub type CellIdx = usize;

/// Rank value before the layering stage has run.
pub const UNSET_RANK: i32 = -1;

/// Minimum extent substituted for zero-size vertices so spacing never
/// degenerates.
pub const MIN_CELL_EXTENT: f64 = 1.0;

/// Node payload: wraps exactly one external vertex.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub vertex: CellId,
    pub width: f64,
    pub height: f64,
    /// Internal edges leaving this node, in creation order.
    pub connects_as_source: Vec<CellIdx>,
    /// Internal edges entering this node, in creation order.
    pub connects_as_target: Vec<CellIdx>,
}

/// Edge payload: wraps a non-empty ordered list of parallel external edges.
#[derive(Debug, Clone)]
pub struct HierarchyEdge {
    /// Wrapped external edges. The first is the core cell; the rest are
    /// geometry-only followers that receive offset waypoints at commit time.
    pub edges: Vec<CellId>,
    pub source: CellIdx,
    pub target: CellIdx,
    /// Set when cycle removal inverted the logical direction. Only affects
    /// how waypoints are ordered at commit time, never the rank span.
    pub is_reversed: bool,
}

#[derive(Debug, Clone)]
pub enum CellKind {
    Node(HierarchyNode),
    Edge(HierarchyEdge),
}

/// A cell in the internal DAG: either a node wrapper or an edge wrapper,
/// with a per-occupied-rank scratch slot and coordinate slots.
#[derive(Debug, Clone)]
pub struct HierarchyCell {
    pub min_rank: i32,
    pub max_rank: i32,
    temp: Vec<i32>,
    x: Vec<f64>,
    y: Vec<f64>,
    pub kind: CellKind,
}

impl HierarchyCell {
    fn new_node(node: HierarchyNode) -> Self {
        Self {
            min_rank: UNSET_RANK,
            max_rank: UNSET_RANK,
            temp: vec![0],
            x: vec![0.0],
            y: vec![0.0],
            kind: CellKind::Node(node),
        }
    }

    fn new_edge(edge: HierarchyEdge) -> Self {
        Self {
            min_rank: UNSET_RANK,
            max_rank: UNSET_RANK,
            temp: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            kind: CellKind::Edge(edge),
        }
    }

    pub fn is_vertex(&self) -> bool {
        matches!(self.kind, CellKind::Node(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self.kind, CellKind::Edge(_))
    }

    /// First wrapped external cell, used to propagate geometry back onto the
    /// real element.
    pub fn core_cell(&self) -> Option<CellId> {
        match &self.kind {
            CellKind::Node(n) => Some(n.vertex),
            CellKind::Edge(e) => e.edges.first().copied(),
        }
    }

    pub fn as_node(&self) -> Option<&HierarchyNode> {
        match &self.kind {
            CellKind::Node(n) => Some(n),
            CellKind::Edge(_) => None,
        }
    }

    pub fn as_edge(&self) -> Option<&HierarchyEdge> {
        match &self.kind {
            CellKind::Edge(e) => Some(e),
            CellKind::Node(_) => None,
        }
    }

    /// Slot index for a per-rank value. Nodes occupy a single rank; edges
    /// index their interior ranks as `layer - min_rank - 1`.
    fn slot(&self, layer: i32) -> usize {
        match self.kind {
            CellKind::Node(_) => 0,
            CellKind::Edge(_) => (layer - self.min_rank - 1) as usize,
        }
    }

    pub fn general_purpose_variable(&self, layer: i32) -> i32 {
        self.temp[self.slot(layer)]
    }

    pub fn set_general_purpose_variable(&mut self, layer: i32, value: i32) {
        let slot = self.slot(layer);
        self.temp[slot] = value;
    }

    /// Cross-axis center for the given occupied rank.
    pub fn x(&self, layer: i32) -> f64 {
        self.x[self.slot(layer)]
    }

    pub fn set_x(&mut self, layer: i32, value: f64) {
        let slot = self.slot(layer);
        self.x[slot] = value;
    }

    /// Primary-axis center for the given occupied rank.
    pub fn y(&self, layer: i32) -> f64 {
        self.y[self.slot(layer)]
    }

    pub fn set_y(&mut self, layer: i32, value: f64) {
        let slot = self.slot(layer);
        self.y[slot] = value;
    }

    /// Sizes the per-rank slots for an edge once its rank span is known.
    pub(crate) fn resize_span(&mut self, interior_ranks: usize) {
        if self.is_edge() {
            self.temp = vec![-1; interior_ranks];
            self.x = vec![0.0; interior_ranks];
            self.y = vec![0.0; interior_ranks];
        }
    }
}

/// The internal DAG for one connected component of the hosting graph.
#[derive(Debug, Default)]
pub struct HierarchyModel {
    pub cells: Vec<HierarchyCell>,
    /// External vertex id to internal node index.
    pub vertex_index: FxHashMap<CellId, CellIdx>,
    /// External edge id to the internal edge that wraps it (every parallel
    /// edge maps to the same internal edge).
    pub edge_index: FxHashMap<CellId, CellIdx>,
    /// Per-rank cell order; the layering stage fills this and the ordering
    /// stage permutes it.
    pub ranks: Vec<Vec<CellIdx>>,
    /// Self-loop edges encountered during the build; excluded from the DAG.
    pub self_loops: Vec<CellId>,
    next_cache: FxHashMap<(CellIdx, i32), Vec<CellIdx>>,
    prev_cache: FxHashMap<(CellIdx, i32), Vec<CellIdx>>,
}

impl HierarchyModel {
    /// Builds the internal DAG for `vertices` (one connected component, in
    /// deterministic order). `edges` may contain edges touching other
    /// components; those are skipped here.
    pub fn build(graph: &GraphModel, vertices: &[CellId], edges: &[CellId]) -> Self {
        let mut model = Self::default();

        for &v in vertices {
            let geometry = graph.geometry(v).copied().unwrap_or_default();
            let idx = model.cells.len();
            model.cells.push(HierarchyCell::new_node(HierarchyNode {
                vertex: v,
                width: geometry.width.max(MIN_CELL_EXTENT),
                height: geometry.height.max(MIN_CELL_EXTENT),
                connects_as_source: Vec::new(),
                connects_as_target: Vec::new(),
            }));
            model.vertex_index.insert(v, idx);
        }

        // Merge parallel edges (same ordered terminal pair) into a single
        // internal edge. Opposite-direction edges stay distinct.
        let mut by_pair: FxHashMap<(CellId, CellId), CellIdx> = FxHashMap::default();
        for &e in edges {
            let Some((s, t)) = graph.terminals(e) else {
                continue;
            };
            if s == t {
                model.self_loops.push(e);
                continue;
            }
            let (Some(&source), Some(&target)) =
                (model.vertex_index.get(&s), model.vertex_index.get(&t))
            else {
                continue;
            };

            if let Some(&idx) = by_pair.get(&(s, t)) {
                if let CellKind::Edge(edge) = &mut model.cells[idx].kind {
                    edge.edges.push(e);
                }
                model.edge_index.insert(e, idx);
                continue;
            }

            let idx = model.cells.len();
            model.cells.push(HierarchyCell::new_edge(HierarchyEdge {
                edges: vec![e],
                source,
                target,
                is_reversed: false,
            }));
            by_pair.insert((s, t), idx);
            model.edge_index.insert(e, idx);

            if let CellKind::Node(n) = &mut model.cells[source].kind {
                n.connects_as_source.push(idx);
            }
            if let CellKind::Node(n) = &mut model.cells[target].kind {
                n.connects_as_target.push(idx);
            }
        }

        model
    }

    pub fn node_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_vertex()).count()
    }

    pub fn max_rank(&self) -> i32 {
        self.ranks.len() as i32 - 1
    }

    /// Node indices in arena order.
    pub fn node_indices(&self) -> impl Iterator<Item = CellIdx> + '_ {
        (0..self.cells.len()).filter(|&i| self.cells[i].is_vertex())
    }

    /// Internal edge indices in arena order.
    pub fn edge_indices(&self) -> impl Iterator<Item = CellIdx> + '_ {
        (0..self.cells.len()).filter(|&i| self.cells[i].is_edge())
    }

    /// Inverts an internal edge in place: swaps source/target, toggles the
    /// reversal flag, and moves the edge between the endpoints' connection
    /// lists. Inverting twice restores the original state.
    pub fn invert_edge(&mut self, idx: CellIdx) {
        let (old_source, old_target) = {
            let CellKind::Edge(edge) = &mut self.cells[idx].kind else {
                return;
            };
            let pair = (edge.source, edge.target);
            edge.source = pair.1;
            edge.target = pair.0;
            edge.is_reversed = !edge.is_reversed;
            pair
        };

        if let CellKind::Node(n) = &mut self.cells[old_source].kind {
            n.connects_as_source.retain(|&e| e != idx);
            n.connects_as_target.push(idx);
        }
        if let CellKind::Node(n) = &mut self.cells[old_target].kind {
            n.connects_as_target.retain(|&e| e != idx);
            n.connects_as_source.push(idx);
        }

        // Structural change: cached adjacency must be rebuilt, never patched.
        self.clear_adjacency_caches();
    }

    pub fn clear_adjacency_caches(&mut self) {
        self.next_cache.clear();
        self.prev_cache.clear();
    }

    /// Cells connected to `idx` in the layer above (`layer - 1`, the source
    /// side). For a node these come from its incoming edges: the upstream
    /// endpoint when it sits directly above, otherwise the edge segment
    /// occupying the intermediate rank. For an edge segment the topmost
    /// occupied rank answers `[source]`; every other interior rank answers
    /// `[self]`.
    ///
    /// Results are memoized for the duration of the pass.
    pub fn next_layer_connected_cells(&mut self, idx: CellIdx, layer: i32) -> Vec<CellIdx> {
        if let Some(cached) = self.next_cache.get(&(idx, layer)) {
            return cached.clone();
        }
        let computed = match &self.cells[idx].kind {
            CellKind::Node(node) => {
                let mut out = Vec::with_capacity(node.connects_as_target.len());
                for &e in &node.connects_as_target {
                    let cell = &self.cells[e];
                    if cell.min_rank == layer - 1 {
                        // Source node sits in the next layer up.
                        if let CellKind::Edge(edge) = &cell.kind {
                            out.push(edge.source);
                        }
                    } else {
                        out.push(e);
                    }
                }
                out
            }
            CellKind::Edge(edge) => {
                if layer - 1 == self.cells[idx].min_rank {
                    vec![edge.source]
                } else {
                    vec![idx]
                }
            }
        };
        self.next_cache.insert((idx, layer), computed.clone());
        computed
    }

    /// Cells connected to `idx` in the layer below (`layer + 1`, the target
    /// side); symmetric to [`Self::next_layer_connected_cells`]. For an edge
    /// segment the bottom-most occupied rank answers `[target]`.
    pub fn previous_layer_connected_cells(&mut self, idx: CellIdx, layer: i32) -> Vec<CellIdx> {
        if let Some(cached) = self.prev_cache.get(&(idx, layer)) {
            return cached.clone();
        }
        let computed = match &self.cells[idx].kind {
            CellKind::Node(node) => {
                let mut out = Vec::with_capacity(node.connects_as_source.len());
                for &e in &node.connects_as_source {
                    let cell = &self.cells[e];
                    if cell.max_rank == layer + 1 {
                        if let CellKind::Edge(edge) = &cell.kind {
                            out.push(edge.target);
                        }
                    } else {
                        out.push(e);
                    }
                }
                out
            }
            CellKind::Edge(edge) => {
                if layer + 1 == self.cells[idx].max_rank {
                    vec![edge.target]
                } else {
                    vec![idx]
                }
            }
        };
        self.prev_cache.insert((idx, layer), computed.clone());
        computed
    }
}
