//! Engine harness with invariant checks.

use crate::memory::InMemoryQueueStore;
use crate::mocks::test_clock;
use std::sync::Arc;
use ticket_queue_core::types::{TicketEntry, TicketNumber, TicketStatus};
use ticket_queue_core::{JoinReceipt, QueueEngine, QueueError};

/// A [`QueueEngine`] over an [`InMemoryQueueStore`], with a second handle on
/// the store for inspecting committed data.
#[derive(Clone, Debug)]
pub struct QueueHarness {
    /// Engine under test
    pub engine: QueueEngine,
    /// Same tables the engine writes to
    pub store: InMemoryQueueStore,
}

impl Default for QueueHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueHarness {
    /// Fresh, initialised queue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(InMemoryQueueStore::new())
    }

    /// Wrap an existing store.
    #[must_use]
    pub fn with_store(store: InMemoryQueueStore) -> Self {
        let engine = QueueEngine::new(Arc::new(store.clone()), Arc::new(test_clock()));
        Self { engine, store }
    }

    /// Join every name in order.
    ///
    /// # Errors
    ///
    /// Returns the first join error.
    pub async fn join_all<I, S>(&self, names: I) -> Result<Vec<JoinReceipt>, QueueError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut receipts = Vec::new();
        for name in names {
            receipts.push(self.engine.join(name.as_ref()).await?);
        }
        Ok(receipts)
    }

    /// Status of one ticket as committed, bypassing the engine.
    pub async fn stored_status(&self, ticket: u64) -> Option<TicketStatus> {
        let ticket = TicketNumber::new(ticket);
        self.store
            .entries()
            .await
            .into_iter()
            .find(|entry| entry.ticket == ticket)
            .map(|entry| entry.status)
    }

    /// Check the queue invariants against committed data.
    ///
    /// - at most one `CALLED` entry, and it matches `current_ticket`
    /// - tickets are exactly `1..=n` with no gaps
    /// - `last_ticket` bounds every ticket and the current ticket
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violated invariant, or if the
    /// meta record is missing.
    pub async fn assert_invariants(&self) {
        let (meta, entries) = self.store.snapshot().await;
        assert!(meta.is_some(), "meta record is missing");
        let meta = meta.unwrap_or_default();

        let called: Vec<&TicketEntry> = entries
            .iter()
            .filter(|entry| entry.status == TicketStatus::Called)
            .collect();
        assert!(called.len() <= 1, "more than one CALLED entry: {called:?}");
        if let Some(entry) = called.first() {
            assert_eq!(
                entry.ticket, meta.current_ticket,
                "CALLED entry does not match current_ticket"
            );
        }

        for (index, entry) in entries.iter().enumerate() {
            assert_eq!(
                entry.ticket.get(),
                index as u64 + 1,
                "ticket numbers are not contiguous"
            );
            assert!(entry.ticket <= meta.last_ticket, "ticket above last_ticket");
        }
        assert!(
            meta.current_ticket <= meta.last_ticket,
            "current_ticket above last_ticket"
        );
    }
}
