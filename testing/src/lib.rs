//! # Ticket Queue Testing
//!
//! Testing utilities for the ticket queue.
//!
//! This crate provides:
//! - [`InMemoryQueueStore`]: a transactional store that never touches disk
//! - [`FixedClock`]: deterministic ticket timestamps
//! - [`QueueHarness`]: an engine wired to an in-memory store, plus
//!   invariant checks against the committed tables
//!
//! ## Example
//!
//! ```ignore
//! use ticket_queue_testing::QueueHarness;
//!
//! #[tokio::test]
//! async fn first_join_is_first_in_line() {
//!     let harness = QueueHarness::new();
//!     let receipt = harness.engine.join("Alice").await.unwrap();
//!     assert_eq!(receipt.position, 0);
//!     harness.assert_invariants().await;
//! }
//! ```

pub mod harness;
pub mod memory;

pub use harness::QueueHarness;
pub use memory::InMemoryQueueStore;

use chrono::{DateTime, Utc};
use ticket_queue_core::environment::Clock;

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, so every ticket gets the same `created_at`.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

pub use mocks::{FixedClock, test_clock};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_queue=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
