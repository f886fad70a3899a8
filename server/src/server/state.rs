//! Application state for the queue HTTP server.

use ticket_queue_core::QueueEngine;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; the engine inside is itself a cheap handle.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The queue engine every endpoint calls into
    pub engine: QueueEngine,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub const fn new(engine: QueueEngine) -> Self {
        Self { engine }
    }
}
