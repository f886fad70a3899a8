//! # Ticket Queue Server
//!
//! HTTP front end for the ticket queue, backed by SQLite.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (axum) ──► QueueEngine ──► SqliteQueueStore
//!                     ▲
//! AutoAdvancer ───────┘   (every EQ_ADVANCE_SECONDS)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: environment-driven configuration
//! - [`api`]: queue endpoint handlers
//! - [`server`]: router and shared state
//! - [`runtime`]: application lifecycle and graceful shutdown

#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod runtime;
pub mod server;

pub use config::Config;
pub use runtime::{Application, ServerError};
