//! Feed reading error types.

use std::path::PathBuf;

use super::Table;

/// Errors that make a feed unreadable.
///
/// Individual malformed rows are not errors; they are skipped and counted
/// in [`ScanStats`](super::ScanStats).
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The feed archive could not be opened
    #[error("failed to open feed {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading table data failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is not a valid zip file
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The table could not be parsed as delimited text
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A table was requested that the feed does not contain
    #[error("feed has no {0} table")]
    MissingTable(Table),
}
