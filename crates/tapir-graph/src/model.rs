use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};

/// Handle for a cell (vertex or edge) in a [`GraphModel`].
///
/// Ids are dense indices into the model's arena and are never reused within
/// one model instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum CellKind {
    Vertex {
        geometry: Rect,
    },
    Edge {
        source: CellId,
        target: CellId,
        points: Vec<Point>,
        style: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Cell {
    parent: Option<CellId>,
    children: Vec<CellId>,
    visible: bool,
    locked: bool,
    kind: CellKind,
}

/// A single buffered write inside an [`Update`] batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Geometry { cell: CellId, geometry: Rect },
    Points { cell: CellId, points: Vec<Point> },
    Style { cell: CellId, style: Option<String> },
}

impl Change {
    pub fn cell(&self) -> CellId {
        match self {
            Change::Geometry { cell, .. }
            | Change::Points { cell, .. }
            | Change::Style { cell, .. } => *cell,
        }
    }
}

type ChangeListener = Box<dyn Fn(&[Change])>;

/// The hosting graph model: an arena of vertex and edge cells with optional
/// container nesting.
#[derive(Default)]
pub struct GraphModel {
    cells: Vec<Cell>,
    roots: Vec<CellId>,
    listeners: Vec<ChangeListener>,
}

impl fmt::Debug for GraphModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphModel")
            .field("cells", &self.cells.len())
            .field("roots", &self.roots.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, parent: Option<CellId>, kind: CellKind) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(Cell {
            parent,
            children: Vec::new(),
            visible: true,
            locked: false,
            kind,
        });
        match parent {
            Some(p) => self.cells[p.0 as usize].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Adds a vertex under `parent` (or at the root when `None`).
    pub fn add_vertex(&mut self, parent: Option<CellId>, geometry: Rect) -> CellId {
        self.insert(parent, CellKind::Vertex { geometry })
    }

    /// Adds an edge between two existing vertices.
    pub fn add_edge(
        &mut self,
        parent: Option<CellId>,
        source: CellId,
        target: CellId,
    ) -> Result<CellId> {
        for terminal in [source, target] {
            match &self.cell(terminal)?.kind {
                CellKind::Vertex { .. } => {}
                CellKind::Edge { .. } => return Err(Error::NotAVertex { cell: terminal }),
            }
        }
        Ok(self.insert(
            parent,
            CellKind::Edge {
                source,
                target,
                points: Vec::new(),
                style: None,
            },
        ))
    }

    fn cell(&self, id: CellId) -> Result<&Cell> {
        self.cells
            .get(id.0 as usize)
            .ok_or(Error::UnknownCell { cell: id })
    }

    pub fn contains(&self, id: CellId) -> bool {
        (id.0 as usize) < self.cells.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Children of a container in insertion order; `None` is the root.
    pub fn children(&self, parent: Option<CellId>) -> &[CellId] {
        match parent {
            Some(p) => self
                .cells
                .get(p.0 as usize)
                .map(|c| c.children.as_slice())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }

    pub fn parent(&self, id: CellId) -> Option<CellId> {
        self.cells.get(id.0 as usize).and_then(|c| c.parent)
    }

    pub fn is_vertex(&self, id: CellId) -> bool {
        matches!(
            self.cells.get(id.0 as usize).map(|c| &c.kind),
            Some(CellKind::Vertex { .. })
        )
    }

    pub fn is_edge(&self, id: CellId) -> bool {
        matches!(
            self.cells.get(id.0 as usize).map(|c| &c.kind),
            Some(CellKind::Edge { .. })
        )
    }

    pub fn geometry(&self, id: CellId) -> Option<&Rect> {
        match self.cells.get(id.0 as usize).map(|c| &c.kind) {
            Some(CellKind::Vertex { geometry }) => Some(geometry),
            _ => None,
        }
    }

    /// Source and target of an edge, in declared order.
    pub fn terminals(&self, id: CellId) -> Option<(CellId, CellId)> {
        match self.cells.get(id.0 as usize).map(|c| &c.kind) {
            Some(CellKind::Edge { source, target, .. }) => Some((*source, *target)),
            _ => None,
        }
    }

    pub fn points(&self, id: CellId) -> Option<&[Point]> {
        match self.cells.get(id.0 as usize).map(|c| &c.kind) {
            Some(CellKind::Edge { points, .. }) => Some(points.as_slice()),
            _ => None,
        }
    }

    pub fn style(&self, id: CellId) -> Option<&str> {
        match self.cells.get(id.0 as usize).map(|c| &c.kind) {
            Some(CellKind::Edge { style, .. }) => style.as_deref(),
            _ => None,
        }
    }

    pub fn is_visible(&self, id: CellId) -> bool {
        self.cells.get(id.0 as usize).is_some_and(|c| c.visible)
    }

    pub fn set_visible(&mut self, id: CellId, visible: bool) {
        if let Some(c) = self.cells.get_mut(id.0 as usize) {
            c.visible = visible;
        }
    }

    pub fn is_locked(&self, id: CellId) -> bool {
        self.cells.get(id.0 as usize).is_some_and(|c| c.locked)
    }

    /// Locks a cell against geometry/waypoint/style writes. A locked cell
    /// causes the whole containing update batch to fail.
    pub fn set_locked(&mut self, id: CellId, locked: bool) {
        if let Some(c) = self.cells.get_mut(id.0 as usize) {
            c.locked = locked;
        }
    }

    /// Registers a listener invoked once per committed update batch.
    pub fn on_change(&mut self, listener: impl Fn(&[Change]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Opens a change batch. Writes buffer in the returned guard and are
    /// applied by [`Update::commit`]; dropping the guard discards them.
    pub fn begin_update(&mut self) -> Update<'_> {
        Update {
            model: self,
            changes: Vec::new(),
        }
    }

    fn validate(&self, change: &Change) -> Result<()> {
        let id = change.cell();
        let cell = self.cell(id)?;
        if cell.locked {
            return Err(Error::CellLocked { cell: id });
        }
        match (change, &cell.kind) {
            (Change::Geometry { .. }, CellKind::Vertex { .. }) => Ok(()),
            (Change::Geometry { .. }, CellKind::Edge { .. }) => {
                Err(Error::NotAVertex { cell: id })
            }
            (Change::Points { .. } | Change::Style { .. }, CellKind::Edge { .. }) => Ok(()),
            (Change::Points { .. } | Change::Style { .. }, CellKind::Vertex { .. }) => {
                Err(Error::NotAnEdge { cell: id })
            }
        }
    }

    fn apply(&mut self, change: Change) {
        let cell = &mut self.cells[change.cell().0 as usize];
        match (change, &mut cell.kind) {
            (Change::Geometry { geometry, .. }, CellKind::Vertex { geometry: g }) => {
                *g = geometry;
            }
            (Change::Points { points: p, .. }, CellKind::Edge { points, .. }) => {
                *points = p;
            }
            (Change::Style { style: s, .. }, CellKind::Edge { style, .. }) => {
                *style = s;
            }
            // validate() ran first; mismatches cannot reach here.
            _ => unreachable!("change validated against the wrong cell kind"),
        }
    }
}

/// Scoped change batch over a [`GraphModel`].
///
/// The guard holds the model's unique borrow for the duration of the batch,
/// so batches cannot interleave. Reads through the model observe the
/// pre-batch state until [`Update::commit`] applies every buffered write.
#[derive(Debug)]
pub struct Update<'a> {
    model: &'a mut GraphModel,
    changes: Vec<Change>,
}

impl Update<'_> {
    pub fn set_geometry(&mut self, cell: CellId, geometry: Rect) {
        self.changes.push(Change::Geometry { cell, geometry });
    }

    pub fn set_points(&mut self, cell: CellId, points: Vec<Point>) {
        self.changes.push(Change::Points { cell, points });
    }

    pub fn clear_points(&mut self, cell: CellId) {
        self.changes.push(Change::Points {
            cell,
            points: Vec::new(),
        });
    }

    pub fn set_style(&mut self, cell: CellId, style: Option<String>) {
        self.changes.push(Change::Style { cell, style });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Validates every buffered write, then applies them all and notifies
    /// listeners once. On error nothing is applied.
    pub fn commit(self) -> Result<()> {
        for change in &self.changes {
            self.model.validate(change)?;
        }
        let changes = self.changes;
        for change in changes.iter().cloned() {
            self.model.apply(change);
        }
        for listener in &self.model.listeners {
            listener(&changes);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn vertex(model: &mut GraphModel) -> CellId {
        model.add_vertex(None, Rect::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn children_preserve_insertion_order() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        let b = vertex(&mut g);
        let e = g.add_edge(None, a, b).unwrap();
        assert_eq!(g.children(None), &[a, b, e]);
        assert!(g.is_vertex(a));
        assert!(g.is_edge(e));
        assert_eq!(g.terminals(e), Some((a, b)));
    }

    #[test]
    fn nested_children_belong_to_their_container() {
        let mut g = GraphModel::new();
        let group = vertex(&mut g);
        let child = g.add_vertex(Some(group), Rect::new(0.0, 0.0, 5.0, 5.0));
        assert_eq!(g.children(None), &[group]);
        assert_eq!(g.children(Some(group)), &[child]);
        assert_eq!(g.parent(child), Some(group));
    }

    #[test]
    fn add_edge_rejects_missing_and_non_vertex_terminals() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        let b = vertex(&mut g);
        let e = g.add_edge(None, a, b).unwrap();
        assert_eq!(
            g.add_edge(None, a, CellId(99)),
            Err(Error::UnknownCell { cell: CellId(99) })
        );
        assert_eq!(g.add_edge(None, a, e), Err(Error::NotAVertex { cell: e }));
    }

    #[test]
    fn commit_applies_all_buffered_writes() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        let b = vertex(&mut g);
        let e = g.add_edge(None, a, b).unwrap();

        let mut update = g.begin_update();
        update.set_geometry(a, Rect::new(1.0, 2.0, 10.0, 10.0));
        update.set_points(e, vec![Point::new(5.0, 5.0)]);
        update.set_style(e, None);
        update.commit().unwrap();

        assert_eq!(g.geometry(a), Some(&Rect::new(1.0, 2.0, 10.0, 10.0)));
        assert_eq!(g.points(e), Some(&[Point::new(5.0, 5.0)][..]));
    }

    #[test]
    fn dropping_an_update_discards_it() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        {
            let mut update = g.begin_update();
            update.set_geometry(a, Rect::new(9.0, 9.0, 9.0, 9.0));
        }
        assert_eq!(g.geometry(a), Some(&Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn locked_cell_fails_the_whole_batch() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        let b = vertex(&mut g);
        g.set_locked(b, true);

        let mut update = g.begin_update();
        update.set_geometry(a, Rect::new(1.0, 1.0, 10.0, 10.0));
        update.set_geometry(b, Rect::new(2.0, 2.0, 10.0, 10.0));
        assert_eq!(update.commit(), Err(Error::CellLocked { cell: b }));

        // Nothing applied, including the write to the unlocked cell.
        assert_eq!(g.geometry(a), Some(&Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn listeners_fire_once_per_batch() {
        let mut g = GraphModel::new();
        let a = vertex(&mut g);
        let b = vertex(&mut g);

        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
        let seen_in_listener = Rc::clone(&seen);
        g.on_change(move |changes| seen_in_listener.borrow_mut().push(changes.len()));

        let mut update = g.begin_update();
        update.set_geometry(a, Rect::new(1.0, 0.0, 10.0, 10.0));
        update.set_geometry(b, Rect::new(2.0, 0.0, 10.0, 10.0));
        update.commit().unwrap();

        assert_eq!(seen.borrow().as_slice(), &[2]);
    }
}
