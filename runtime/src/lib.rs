//! # Ticket Queue Runtime
//!
//! Long-running pieces that sit next to the request layer:
//!
//! - [`AutoAdvancer`]: calls the next ticket on a fixed period
//! - [`metrics::MetricsServer`]: Prometheus recorder and scrape rendering
//!
//! Both stop on the same `tokio::sync::broadcast` shutdown signal the
//! server uses for graceful shutdown.

#![forbid(unsafe_code)]

pub mod auto_advance;
pub mod metrics;

pub use auto_advance::{AutoAdvancer, TickOutcome, tick};
pub use metrics::{MetricsError, MetricsServer};
