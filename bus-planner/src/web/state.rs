//! Application state for the web layer.

use crate::engine::EngineHandle;

/// Shared application state.
#[derive(Clone, Default)]
pub struct AppState {
    /// The current engine; empty until the first feed load
    pub engine: EngineHandle,
}

impl AppState {
    /// Create a new app state.
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}
