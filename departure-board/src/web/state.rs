//! Application state for the web layer.

use std::sync::Arc;

use crate::board::DepartureBoard;

/// Shared application state.
///
/// Contains the departure board every handler queries.
pub struct AppState<S> {
    /// Departure query engine over the loaded feed
    pub board: Arc<DepartureBoard<S>>,
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(board: DepartureBoard<S>) -> Self {
        Self {
            board: Arc::new(board),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            board: Arc::clone(&self.board),
        }
    }
}
