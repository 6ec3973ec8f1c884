//! Web layer for the departure board.
//!
//! Provides JSON endpoints for stop search, departures and trip routes.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
