//! Storage abstraction for the ticket queue.
//!
//! The engine needs a durable, key-sorted ticket table plus one meta record,
//! and it needs every multi-step operation to run inside a single
//! transaction. [`QueueStore`] opens transactions; [`QueueTransaction`]
//! exposes the read-modify-write primitives.
//!
//! # Implementations
//!
//! - `SqliteQueueStore` (in `ticket-queue-sqlite`): production storage
//! - `InMemoryQueueStore` (in `ticket-queue-testing`): fast, deterministic tests
//!
//! # Dyn Compatibility
//!
//! Both traits return `Pin<Box<dyn Future>>` instead of using `async fn` so
//! the engine can hold an `Arc<dyn QueueStore>` and work with
//! `Box<dyn QueueTransaction>` without being generic over the backend.

use crate::types::{QueueMeta, SortOrder, TicketEntry, TicketNumber, TicketRange, TicketStatus};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors that can occur during store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The meta singleton row is missing.
    #[error("queue meta record is missing")]
    StoreUnavailable,

    /// A ticket with this number already exists.
    #[error("ticket {0} already exists")]
    DuplicateTicket(TicketNumber),

    /// No entry with this ticket number.
    #[error("ticket {0} does not exist")]
    EntryNotFound(TicketNumber),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be decoded.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// Durable storage for ticket entries and the queue meta record.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one store is shared by every
/// request handler and the auto-advance task.
pub trait QueueStore: Send + Sync {
    /// Open a transaction.
    ///
    /// Changes made through the transaction become visible only after
    /// [`QueueTransaction::commit`]. Dropping it without committing discards them.
    ///
    /// # Errors
    ///
    /// - `Database`: the backend could not start a transaction
    fn begin(&self) -> StoreFuture<'_, Box<dyn QueueTransaction>>;
}

/// One open store transaction.
pub trait QueueTransaction: Send {
    /// Read the meta singleton.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable`: the singleton row does not exist
    fn read_meta(&mut self) -> StoreFuture<'_, QueueMeta>;

    /// Overwrite the meta singleton, creating it if it is missing.
    ///
    /// # Errors
    ///
    /// - `Database`: the write failed
    fn write_meta(&mut self, meta: QueueMeta) -> StoreFuture<'_, ()>;

    /// Insert a new ticket entry.
    ///
    /// # Errors
    ///
    /// - `DuplicateTicket`: the ticket number is already taken
    fn insert_entry(&mut self, entry: TicketEntry) -> StoreFuture<'_, ()>;

    /// Look up one entry by ticket number.
    ///
    /// # Errors
    ///
    /// - `Database` / `CorruptRecord`: the read or decode failed
    fn find_entry(&mut self, ticket: TicketNumber) -> StoreFuture<'_, Option<TicketEntry>>;

    /// Set the status of one entry.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`: no entry has this ticket number
    fn update_status(&mut self, ticket: TicketNumber, status: TicketStatus)
    -> StoreFuture<'_, ()>;

    /// Move every entry in `current` status to `new`. Returns the number changed.
    ///
    /// # Errors
    ///
    /// - `Database`: the update failed
    fn update_status_where(
        &mut self,
        current: TicketStatus,
        new: TicketStatus,
    ) -> StoreFuture<'_, u64>;

    /// Count entries whose status is in `statuses` and whose ticket is inside `range`.
    ///
    /// # Errors
    ///
    /// - `Database`: the query failed
    fn count_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        range: TicketRange,
    ) -> StoreFuture<'a, u64>;

    /// First ticket, in `order`, whose status is in `statuses` and which is
    /// strictly greater than `after`.
    ///
    /// # Errors
    ///
    /// - `Database`: the query failed
    fn find_first_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        after: TicketNumber,
        order: SortOrder,
    ) -> StoreFuture<'a, Option<TicketNumber>>;

    /// Delete every ticket entry. The meta record is untouched. Returns the number deleted.
    ///
    /// # Errors
    ///
    /// - `Database`: the delete failed
    fn delete_all_entries(&mut self) -> StoreFuture<'_, u64>;

    /// Make every change in this transaction durable.
    ///
    /// # Errors
    ///
    /// - `Database`: the commit failed; nothing was applied
    fn commit(self: Box<Self>) -> StoreFuture<'static, ()>;
}
