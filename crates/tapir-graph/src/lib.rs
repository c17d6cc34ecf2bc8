#![forbid(unsafe_code)]

//! Transactional diagram graph model consumed by `tapir`.
//!
//! The model stores vertices (with geometry) and edges (with terminals and
//! waypoints) in a flat arena addressed by [`CellId`], with optional
//! parent/child nesting for containers. All mutation of geometry, waypoints
//! and styles goes through a scoped change batch ([`GraphModel::begin_update`])
//! that is applied all-or-nothing and notifies change listeners once per
//! batch.

pub mod error;
pub mod geometry;
pub mod model;

pub use error::{Error, Result};
pub use geometry::{Point, Rect};
pub use model::{CellId, Change, GraphModel, Update};
