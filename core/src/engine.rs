//! The queue engine.
//!
//! [`QueueEngine`] owns every business rule: ticket issuance, position
//! computation, the advance algorithm, status lookups and reset. Each
//! operation runs as one store transaction inside one process-wide critical
//! section, so concurrent joins never compute the same ticket and nobody
//! sees an advance halfway through.
//!
//! # Advance
//!
//! ```text
//! 1. select  lowest WAITING ticket > current_ticket
//! 2. demote  CALLED → DONE            (advance only; advance_if_possible
//!                                       stops before this when 1 found nothing)
//! 3. promote selected WAITING → CALLED, current_ticket = selected
//! 4. count   WAITING + CALLED
//! ```
//!
//! Join never calls a ticket, even into an empty queue. Only advance moves
//! `current_ticket`.

use crate::environment::Clock;
use crate::error::QueueError;
use crate::store::{QueueStore, QueueTransaction, StoreError};
use crate::types::{
    JoinReceipt, QueueMeta, QueueState, SortOrder, TicketEntry, TicketName, TicketNumber,
    TicketRange, TicketStatus, TicketStatusView,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Who asked for an advance. Used for logs and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceTrigger {
    /// An operator request.
    Manual,
    /// The periodic timer.
    Auto,
}

impl AdvanceTrigger {
    /// Label value for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Auto => "auto",
        }
    }
}

/// Ticket queue engine.
///
/// Cheap to clone: clones share the store, the clock and the critical
/// section. Construct one at startup and hand clones to the request layer
/// and the timer.
#[derive(Clone)]
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    lock: Arc<Mutex<()>>,
}

impl fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEngine").finish_non_exhaustive()
    }
}

impl QueueEngine {
    /// Create an engine over `store`, stamping tickets with `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Issue the next ticket to `name`.
    ///
    /// The name is trimmed and validated before anything is locked or
    /// written. The returned position counts active tickets strictly
    /// between the current ticket and the new one.
    ///
    /// # Errors
    ///
    /// - `InvalidName`: blank or longer than 64 characters
    /// - `StoreUnavailable`: the meta record is missing
    /// - `Store`: any other storage failure
    pub async fn join(&self, name: &str) -> Result<JoinReceipt, QueueError> {
        let name = TicketName::parse(name)?;

        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        let meta = load_meta(tx.as_mut()).await?;
        let ticket = meta.last_ticket.next();
        tx.insert_entry(TicketEntry::waiting(ticket, name, self.clock.now()))
            .await?;
        tx.write_meta(QueueMeta {
            last_ticket: ticket,
            ..meta
        })
        .await?;
        let position = position_of(tx.as_mut(), ticket, meta.current_ticket).await?;
        tx.commit().await?;

        info!(
            ticket = %ticket,
            position,
            current_ticket = %meta.current_ticket,
            "Ticket issued"
        );
        metrics::counter!("queue_tickets_issued_total").increment(1);

        Ok(JoinReceipt {
            ticket,
            position,
            current_ticket: meta.current_ticket,
        })
    }

    /// Read the current queue state.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable`: the meta record is missing
    /// - `Store`: any other storage failure
    pub async fn state(&self) -> Result<QueueState, QueueError> {
        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        let meta = load_meta(tx.as_mut()).await?;
        let length = active_length(tx.as_mut()).await?;
        tx.commit().await?;

        let state = QueueState::new(meta, length);
        debug!(?state, "Queue state read");
        Ok(state)
    }

    /// Look up one ticket.
    ///
    /// Active tickets get a position computed against the current ticket;
    /// `DONE` tickets always report position 0.
    ///
    /// # Errors
    ///
    /// - `TicketNotFound`: no entry has this number
    /// - `StoreUnavailable`: the meta record is missing
    /// - `Store`: any other storage failure
    pub async fn status(&self, ticket: TicketNumber) -> Result<TicketStatusView, QueueError> {
        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        let meta = load_meta(tx.as_mut()).await?;
        let Some(entry) = tx.find_entry(ticket).await? else {
            debug!(ticket = %ticket, "Status requested for unknown ticket");
            return Err(QueueError::TicketNotFound(ticket));
        };
        let position = if entry.status.is_active() {
            position_of(tx.as_mut(), ticket, meta.current_ticket).await?
        } else {
            0
        };
        tx.commit().await?;

        Ok(TicketStatusView {
            ticket,
            status: entry.status,
            position,
            current_ticket: meta.current_ticket,
        })
    }

    /// Finish the current ticket and call the next one.
    ///
    /// Always produces a state. When nothing is waiting above the current
    /// ticket, the `CALLED` entry (if any) is still marked `DONE` and
    /// `current_ticket` stays where it was.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable`: the meta record is missing
    /// - `Store`: any other storage failure
    pub async fn advance(&self) -> Result<QueueState, QueueError> {
        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        let meta = load_meta(tx.as_mut()).await?;
        let next = next_waiting(tx.as_mut(), meta.current_ticket).await?;
        let state = advance_locked(tx.as_mut(), meta, next).await?;
        tx.commit().await?;

        record_advance(AdvanceTrigger::Manual, meta.current_ticket, &state);
        Ok(state)
    }

    /// Advance only if a `WAITING` ticket exists above the current one.
    ///
    /// Returns `Ok(None)` without touching storage otherwise; in particular
    /// the `CALLED` entry stays `CALLED`.
    ///
    /// # Errors
    ///
    /// - `StoreUnavailable`: the meta record is missing
    /// - `Store`: any other storage failure
    pub async fn advance_if_possible(&self) -> Result<Option<QueueState>, QueueError> {
        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        let meta = load_meta(tx.as_mut()).await?;
        let Some(next) = next_waiting(tx.as_mut(), meta.current_ticket).await? else {
            debug!(current_ticket = %meta.current_ticket, "Nothing to advance");
            return Ok(None);
        };
        let state = advance_locked(tx.as_mut(), meta, Some(next)).await?;
        tx.commit().await?;

        record_advance(AdvanceTrigger::Auto, meta.current_ticket, &state);
        Ok(Some(state))
    }

    /// Delete every ticket and zero the meta record.
    ///
    /// A missing meta record is rebuilt here, and logged as abnormal; every
    /// other operation refuses to run without one.
    ///
    /// # Errors
    ///
    /// - `Store`: any storage failure
    pub async fn reset(&self) -> Result<QueueState, QueueError> {
        let _guard = self.lock.lock().await;
        let mut tx = self.store.begin().await?;

        match tx.read_meta().await {
            Ok(_) => {}
            Err(StoreError::StoreUnavailable) => {
                warn!("Queue meta record is missing; reset is rebuilding it");
            }
            Err(e) => return Err(e.into()),
        }

        let deleted = tx.delete_all_entries().await?;
        let meta = QueueMeta::default();
        tx.write_meta(meta).await?;
        let length = active_length(tx.as_mut()).await?;
        tx.commit().await?;

        info!(deleted, "Queue reset");
        metrics::counter!("queue_resets_total").increment(1);
        record_gauges(&QueueState::new(meta, length));

        Ok(QueueState::new(meta, length))
    }
}

async fn load_meta(tx: &mut dyn QueueTransaction) -> Result<QueueMeta, QueueError> {
    match tx.read_meta().await {
        Ok(meta) => Ok(meta),
        Err(StoreError::StoreUnavailable) => {
            error!("Queue meta record is missing; storage is uninitialised or corrupted");
            Err(QueueError::StoreUnavailable)
        }
        Err(e) => Err(e.into()),
    }
}

async fn position_of(
    tx: &mut dyn QueueTransaction,
    ticket: TicketNumber,
    current_ticket: TicketNumber,
) -> Result<u64, QueueError> {
    Ok(tx
        .count_where(
            &TicketStatus::ACTIVE,
            TicketRange::between(current_ticket, ticket),
        )
        .await?)
}

async fn active_length(tx: &mut dyn QueueTransaction) -> Result<u64, QueueError> {
    Ok(tx
        .count_where(&TicketStatus::ACTIVE, TicketRange::all())
        .await?)
}

async fn next_waiting(
    tx: &mut dyn QueueTransaction,
    current_ticket: TicketNumber,
) -> Result<Option<TicketNumber>, QueueError> {
    Ok(tx
        .find_first_where(
            &[TicketStatus::Waiting],
            current_ticket,
            SortOrder::Ascending,
        )
        .await?)
}

async fn advance_locked(
    tx: &mut dyn QueueTransaction,
    meta: QueueMeta,
    next: Option<TicketNumber>,
) -> Result<QueueState, QueueError> {
    let demoted = tx
        .update_status_where(TicketStatus::Called, TicketStatus::Done)
        .await?;
    if demoted > 1 {
        error!(demoted, "More than one ticket was CALLED");
    }

    let current_ticket = match next {
        Some(ticket) => {
            tx.update_status(ticket, TicketStatus::Called).await?;
            ticket
        }
        None => meta.current_ticket,
    };
    let meta = QueueMeta {
        current_ticket,
        ..meta
    };
    tx.write_meta(meta).await?;

    let length = active_length(tx).await?;
    Ok(QueueState::new(meta, length))
}

fn record_advance(trigger: AdvanceTrigger, previous: TicketNumber, state: &QueueState) {
    info!(
        trigger = trigger.as_str(),
        previous_ticket = %previous,
        current_ticket = %state.current_ticket,
        length = state.length,
        "Queue advanced"
    );
    metrics::counter!("queue_advances_total", "trigger" => trigger.as_str()).increment(1);
    record_gauges(state);
}

#[allow(clippy::cast_precision_loss)] // Queue sizes are far below f64's exact range
fn record_gauges(state: &QueueState) {
    metrics::gauge!("queue_length").set(state.length as f64);
    metrics::gauge!("queue_current_ticket").set(state.current_ticket.get() as f64);
}
