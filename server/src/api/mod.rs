//! HTTP API endpoints.

pub mod queue;
