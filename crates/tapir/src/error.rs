pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The transactional commit against the hosting graph model failed; no
    /// geometry was written.
    #[error("failed to commit layout geometry: {0}")]
    Commit(#[from] tapir_graph::Error),
}
