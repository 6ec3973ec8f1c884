//! Stop-time cache error types.

use std::path::PathBuf;

/// Errors from the durable stop-time cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database could not be opened, read or written
    #[error("storage error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The directory for the database file could not be created
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored row no longer satisfies the domain invariants
    #[error("invalid cached row: {0}")]
    InvalidRow(String),
}
