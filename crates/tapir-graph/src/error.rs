use crate::model::CellId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unknown cell: {cell}")]
    UnknownCell { cell: CellId },

    #[error("cell is not a vertex: {cell}")]
    NotAVertex { cell: CellId },

    #[error("cell is not an edge: {cell}")]
    NotAnEdge { cell: CellId },

    #[error("cell is locked against modification: {cell}")]
    CellLocked { cell: CellId },
}
