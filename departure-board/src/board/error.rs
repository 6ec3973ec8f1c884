//! Departure board error types.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{StopId, TripId};
use crate::feed::FeedError;
use crate::store::StoreError;

/// Errors from departure board operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// The feed could not be read
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// The stop-time cache could not be read or written
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stop is not in the feed's stop index
    #[error("unknown stop: {0}")]
    UnknownStop(StopId),

    /// The trip has neither a trips row nor any stop times
    #[error("unknown trip: {0}")]
    UnknownTrip(TripId),

    /// A feed scan did not finish within the configured timeout
    #[error("scan of {what} timed out after {}s", .after.as_secs())]
    ScanTimeout { what: &'static str, after: Duration },

    /// The blocking scan task panicked or was cancelled
    #[error("scan of {what} aborted: {message}")]
    ScanAborted { what: &'static str, message: String },

    /// A failure shared by every caller waiting on the same computation
    #[error(transparent)]
    Shared(Arc<BoardError>),
}

impl BoardError {
    /// Whether the same request may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        match self {
            BoardError::ScanTimeout { .. } => true,
            BoardError::Shared(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}

impl From<Arc<BoardError>> for BoardError {
    fn from(err: Arc<BoardError>) -> Self {
        BoardError::Shared(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Table;

    #[test]
    fn error_display() {
        let err = BoardError::UnknownStop(StopId::new("de:08222:2417").unwrap());
        assert_eq!(err.to_string(), "unknown stop: de:08222:2417");

        let err = BoardError::ScanTimeout {
            what: "stop_times",
            after: Duration::from_secs(300),
        };
        assert_eq!(err.to_string(), "scan of stop_times timed out after 300s");

        let err = BoardError::from(FeedError::MissingTable(Table::Trips));
        assert_eq!(err.to_string(), "feed has no trips.txt table");
    }

    #[test]
    fn only_timeouts_are_retryable() {
        let timeout = BoardError::ScanTimeout {
            what: "trips",
            after: Duration::from_secs(1),
        };
        assert!(timeout.is_retryable());
        assert!(BoardError::Shared(Arc::new(timeout)).is_retryable());

        assert!(!BoardError::UnknownTrip(TripId::new("T1").unwrap()).is_retryable());
        assert!(!BoardError::from(FeedError::MissingTable(Table::Stops)).is_retryable());
    }
}
