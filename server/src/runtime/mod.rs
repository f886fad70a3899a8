//! Process runtime: startup, background tasks and graceful shutdown.

pub mod lifecycle;

pub use lifecycle::{Application, ServerError};
