//! Web layer for the bus itinerary engine.
//!
//! Provides HTTP endpoints for planning itineraries and inspecting the
//! loaded feed.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, SESSION_HEADER, create_router};
pub use state::AppState;
