//! HTTP server module for the queue.
//!
//! This module provides the Axum router and the state it shares with
//! handlers. Errors, extractors, layers and the health check come from
//! `ticket-queue-web`.

pub mod routes;
pub mod state;

pub use routes::{build_router, metrics_router};
pub use state::AppState;
