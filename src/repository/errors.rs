use thiserror::Error;

/// Result type returned by all repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors surfaced by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted record does not exist (or is out of the caller's scope).
    #[error("record not found")]
    NotFound,
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// The connection pool could not hand out a connection.
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    /// A stored row could not be mapped back into its domain shape.
    #[error("invalid stored data: {0}")]
    InvalidData(String),
}
