//! Axum integration for the ticket queue.
//!
//! The request layer is a thin shell around
//! [`QueueEngine`](ticket_queue_core::QueueEngine): it parses requests,
//! calls one engine operation, and maps the result to JSON.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request ([`JsonBody`], [`TicketQuery`])
//! 3. **Call** the engine
//! 4. **Map result** to a JSON body, or an [`AppError`] with `{"error": ...}`
//!
//! This crate carries the pieces that are not tied to a route table:
//! errors, extractors, layers, fallbacks and the health check. The server
//! crate wires them into a router.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{INVALID_JSON_BODY, INVALID_TICKET_QUERY, JsonBody, TicketQuery};
pub use middleware::{cors_layer, method_not_allowed, not_found, options_no_content, trace_layer};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
