use serde::{Deserialize, Serialize};

/// Direction of the primary (rank) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Ranks run top to bottom; rank 0 is the topmost row.
    #[default]
    Vertical,
    /// Ranks run left to right; rank 0 is the leftmost column.
    Horizontal,
}

/// Configuration accepted by [`HierarchicalLayout`](crate::HierarchicalLayout).
///
/// All knobs are plain scalars with stated defaults; there is no nested or
/// dynamic option schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub orientation: Orientation,
    /// Spacing between adjacent ranks along the primary axis.
    pub inter_rank_spacing: f64,
    /// Spacing between adjacent cells within a rank.
    pub intra_cell_spacing: f64,
    /// Lateral spacing between parallel edges sharing the same terminals.
    pub parallel_edge_spacing: f64,
    /// Translate the finished layout so its bounding box starts at the
    /// origin instead of the pre-layout bounding box origin.
    pub move_to_origin: bool,
    /// Clear stale waypoints on edges that were skipped by the layout.
    pub reset_edges: bool,
    /// Clear custom routing styles on edges the layout routed.
    pub disable_edge_style: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            inter_rank_spacing: 100.0,
            intra_cell_spacing: 30.0,
            parallel_edge_spacing: 10.0,
            move_to_origin: false,
            reset_edges: true,
            disable_edge_style: true,
        }
    }
}
