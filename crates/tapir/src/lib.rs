#![forbid(unsafe_code)]

//! Hierarchical (layered) graph layout in the style of mxGraph's
//! hierarchical layout.
//!
//! The engine consumes an abstract diagram graph ([`tapir_graph::GraphModel`]:
//! vertices, edges, parent/child nesting) and writes back vertex positions
//! and edge waypoints inside a single transactional update. Internally it
//! builds a throwaway hierarchy model per connected component and runs the
//! classic four stages: cycle removal by edge inversion, longest-path
//! layering, median crossing reduction and coordinate assignment.
//!
//! ```
//! use tapir::{HierarchicalLayout, LayoutOptions};
//! use tapir_graph::{GraphModel, Rect};
//!
//! let mut graph = GraphModel::new();
//! let a = graph.add_vertex(None, Rect::new(0.0, 0.0, 40.0, 20.0));
//! let b = graph.add_vertex(None, Rect::new(0.0, 0.0, 40.0, 20.0));
//! graph.add_edge(None, a, b).unwrap();
//!
//! let layout = HierarchicalLayout::new(LayoutOptions::default());
//! let report = layout.execute(&mut graph, None).unwrap();
//! assert_eq!(report.components, 1);
//! ```

pub use tapir_graph as graph;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod acyclic;
pub mod error;
pub mod layout;
pub mod model;
pub mod options;
pub mod order;
pub mod position;
pub mod rank;

pub use error::{Error, Result};
pub use layout::{HierarchicalLayout, LayoutReport};
pub use options::{LayoutOptions, Orientation};
