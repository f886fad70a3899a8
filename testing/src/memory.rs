//! In-memory queue store.
//!
//! Transactions take an owned lock on the tables and work on a staged copy.
//! `commit` publishes the copy; dropping the transaction throws it away.
//! That gives the same all-or-nothing behaviour as the SQLite store without
//! touching disk.

use std::collections::BTreeMap;
use std::sync::Arc;
use ticket_queue_core::store::{QueueStore, QueueTransaction, StoreError, StoreFuture};
use ticket_queue_core::types::{
    QueueMeta, SortOrder, TicketEntry, TicketNumber, TicketRange, TicketStatus,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug, Default)]
struct Tables {
    meta: Option<QueueMeta>,
    entries: BTreeMap<TicketNumber, TicketEntry>,
}

/// In-memory [`QueueStore`] for tests.
///
/// Clones share the same tables, so a test can keep one handle for
/// inspection while the engine owns another.
#[derive(Clone, Debug)]
pub struct InMemoryQueueStore {
    tables: Arc<Mutex<Tables>>,
}

impl Default for InMemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueueStore {
    /// Create an initialised store: empty ticket table, zeroed meta record.
    #[must_use]
    pub fn new() -> Self {
        Self::with_meta(Some(QueueMeta::default()))
    }

    /// Create a store whose meta record was never written.
    #[must_use]
    pub fn without_meta() -> Self {
        Self::with_meta(None)
    }

    fn with_meta(meta: Option<QueueMeta>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables {
                meta,
                entries: BTreeMap::new(),
            })),
        }
    }

    /// Committed meta record, if any.
    pub async fn meta(&self) -> Option<QueueMeta> {
        self.tables.lock().await.meta
    }

    /// Committed entries in ticket order.
    pub async fn entries(&self) -> Vec<TicketEntry> {
        self.tables.lock().await.entries.values().cloned().collect()
    }

    /// Meta record and entries read under one lock, so both come from the
    /// same committed state.
    pub async fn snapshot(&self) -> (Option<QueueMeta>, Vec<TicketEntry>) {
        let tables = self.tables.lock().await;
        (tables.meta, tables.entries.values().cloned().collect())
    }

    /// Drop the meta record, simulating corrupted storage.
    pub async fn remove_meta(&self) {
        self.tables.lock().await.meta = None;
    }
}

impl QueueStore for InMemoryQueueStore {
    fn begin(&self) -> StoreFuture<'_, Box<dyn QueueTransaction>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let guard = tables.lock_owned().await;
            let staged = guard.clone();
            Ok(Box::new(InMemoryTransaction { guard, staged }) as Box<dyn QueueTransaction>)
        })
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

impl InMemoryTransaction {
    fn matching<'a>(
        &'a self,
        statuses: &'a [TicketStatus],
    ) -> impl DoubleEndedIterator<Item = &'a TicketEntry> + 'a {
        self.staged
            .entries
            .values()
            .filter(move |entry| statuses.contains(&entry.status))
    }
}

impl QueueTransaction for InMemoryTransaction {
    fn read_meta(&mut self) -> StoreFuture<'_, QueueMeta> {
        Box::pin(async move { self.staged.meta.ok_or(StoreError::StoreUnavailable) })
    }

    fn write_meta(&mut self, meta: QueueMeta) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.staged.meta = Some(meta);
            Ok(())
        })
    }

    fn insert_entry(&mut self, entry: TicketEntry) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.staged.entries.contains_key(&entry.ticket) {
                return Err(StoreError::DuplicateTicket(entry.ticket));
            }
            self.staged.entries.insert(entry.ticket, entry);
            Ok(())
        })
    }

    fn find_entry(&mut self, ticket: TicketNumber) -> StoreFuture<'_, Option<TicketEntry>> {
        Box::pin(async move { Ok(self.staged.entries.get(&ticket).cloned()) })
    }

    fn update_status(
        &mut self,
        ticket: TicketNumber,
        status: TicketStatus,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let entry = self
                .staged
                .entries
                .get_mut(&ticket)
                .ok_or(StoreError::EntryNotFound(ticket))?;
            entry.status = status;
            Ok(())
        })
    }

    fn update_status_where(
        &mut self,
        current: TicketStatus,
        new: TicketStatus,
    ) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let mut changed = 0;
            for entry in self.staged.entries.values_mut() {
                if entry.status == current {
                    entry.status = new;
                    changed += 1;
                }
            }
            Ok(changed)
        })
    }

    fn count_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        range: TicketRange,
    ) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            let count = self
                .matching(statuses)
                .filter(|entry| range.contains(entry.ticket))
                .count();
            Ok(count as u64)
        })
    }

    fn find_first_where<'a>(
        &'a mut self,
        statuses: &'a [TicketStatus],
        after: TicketNumber,
        order: SortOrder,
    ) -> StoreFuture<'a, Option<TicketNumber>> {
        Box::pin(async move {
            let mut candidates = self
                .matching(statuses)
                .filter(|entry| entry.ticket > after)
                .map(|entry| entry.ticket);
            let found = match order {
                SortOrder::Ascending => candidates.next(),
                SortOrder::Descending => candidates.next_back(),
            };
            Ok(found)
        })
    }

    fn delete_all_entries(&mut self) -> StoreFuture<'_, u64> {
        Box::pin(async move {
            let deleted = self.staged.entries.len() as u64;
            self.staged.entries.clear();
            Ok(deleted)
        })
    }

    fn commit(self: Box<Self>) -> StoreFuture<'static, ()> {
        let Self { mut guard, staged } = *self;
        Box::pin(async move {
            *guard = staged;
            Ok(())
        })
    }
}
