//! # Ticket Queue Core
//!
//! Domain types and the queue engine for a single "take a ticket, wait your
//! turn" queue.
//!
//! ## Core Concepts
//!
//! - **Ticket**: a positive number issued in join order, never reused until a reset
//! - **Status**: `WAITING` → `CALLED` → `DONE`; only advance moves a ticket forward
//! - **Current ticket**: the one ticket being served (0 when nobody is)
//! - **Position**: active tickets strictly between the current ticket and this one
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │  Request layer / timer    │  ← HTTP handlers, AutoAdvancer
//! ├───────────────────────────┤
//! │  QueueEngine              │  ← business rules, one critical section
//! ├───────────────────────────┤
//! │  QueueStore / Transaction │  ← SQLite (production), in-memory (tests)
//! └───────────────────────────┘
//! ```
//!
//! Every engine operation takes the engine lock, opens one store
//! transaction, and commits it before the lock is released. Callers never
//! observe a half-applied advance.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_queue_core::{QueueEngine, environment::SystemClock};
//!
//! let engine = QueueEngine::new(Arc::new(store), Arc::new(SystemClock));
//!
//! let receipt = engine.join("Alice").await?;
//! assert_eq!(receipt.position, 0);
//!
//! let state = engine.advance().await?;
//! assert_eq!(state.current_ticket, receipt.ticket);
//! ```

#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod store;
pub mod types;

pub use engine::{AdvanceTrigger, QueueEngine};
pub use error::{ErrorKind, QueueError};
pub use store::{QueueStore, QueueTransaction, StoreError, StoreFuture};
pub use types::{
    JoinReceipt, MAX_NAME_LEN, NameError, QueueMeta, QueueState, SortOrder, TicketEntry,
    TicketName, TicketNumber, TicketRange, TicketStatus, TicketStatusView,
};

/// Environment traits for dependency injection.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Ticket timestamps are informational only; ordering always comes from
    /// the ticket number. Tests swap in a fixed clock to get stable values.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock used in production.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
