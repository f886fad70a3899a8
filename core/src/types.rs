//! Domain types for the ticket queue.
//!
//! Everything here is plain data: ticket numbers, statuses, validated names,
//! the meta singleton and the snapshots returned by the engine. Snapshot
//! types serialize to the exact JSON shapes the HTTP surface promises.

use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a display name, counted in characters after trimming.
pub const MAX_NAME_LEN: usize = 64;

/// A ticket number.
///
/// Issued tickets start at 1. The value 0 is reserved for "nobody is being
/// served" in [`QueueMeta::current_ticket`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketNumber(u64);

impl TicketNumber {
    /// "No ticket" marker used by the meta record.
    pub const NONE: Self = Self(0);

    /// Creates a ticket number from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the ticket issued after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// True for the "no ticket" marker.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TicketNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Lifecycle state of a ticket entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    /// Issued, not yet served.
    Waiting,
    /// Currently being served. At most one entry holds this status.
    Called,
    /// Finished being served. Kept for status lookups.
    Done,
}

impl TicketStatus {
    /// Statuses that count towards queue length and position.
    pub const ACTIVE: [Self; 2] = [Self::Waiting, Self::Called];

    /// Convert status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Called => "CALLED",
            Self::Done => "DONE",
        }
    }

    /// Parse status from its stored string representation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptRecord`] if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        match s {
            "WAITING" => Ok(Self::Waiting),
            "CALLED" => Ok(Self::Called),
            "DONE" => Ok(Self::Done),
            _ => Err(StoreError::CorruptRecord(format!(
                "Invalid ticket status: {s}"
            ))),
        }
    }

    /// True for `WAITING` and `CALLED`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Waiting | Self::Called)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a display name was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Empty after trimming surrounding whitespace.
    #[error("name is required")]
    Empty,

    /// Longer than [`MAX_NAME_LEN`] characters after trimming.
    #[error("name is too long (max {max})")]
    TooLong {
        /// The length limit that was exceeded.
        max: usize,
    },
}

/// A validated display name: trimmed, non-empty, at most [`MAX_NAME_LEN`] characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TicketName(String);

impl TicketName {
    /// Trim and validate a raw name.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Empty`] for blank input and [`NameError::TooLong`]
    /// when the trimmed name exceeds [`MAX_NAME_LEN`] characters.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(NameError::TooLong { max: MAX_NAME_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the owned string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TicketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the ticket table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEntry {
    /// Unique ticket number
    pub ticket: TicketNumber,
    /// Display label supplied on join
    pub name: String,
    /// Lifecycle status
    pub status: TicketStatus,
    /// When the ticket was issued
    pub created_at: DateTime<Utc>,
}

impl TicketEntry {
    /// Creates a freshly issued entry in `WAITING` status.
    #[must_use]
    pub fn waiting(ticket: TicketNumber, name: TicketName, created_at: DateTime<Utc>) -> Self {
        Self {
            ticket,
            name: name.into_inner(),
            status: TicketStatus::Waiting,
            created_at,
        }
    }
}

/// The queue meta singleton.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMeta {
    /// Ticket currently `CALLED`, or [`TicketNumber::NONE`].
    pub current_ticket: TicketNumber,
    /// Highest ticket ever issued since the last reset.
    pub last_ticket: TicketNumber,
}

/// Exclusive ticket bounds for range queries. `None` leaves a side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicketRange {
    /// Lower bound, exclusive.
    pub after: Option<TicketNumber>,
    /// Upper bound, exclusive.
    pub before: Option<TicketNumber>,
}

impl TicketRange {
    /// Every ticket.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            after: None,
            before: None,
        }
    }

    /// Tickets strictly between `after` and `before`.
    #[must_use]
    pub const fn between(after: TicketNumber, before: TicketNumber) -> Self {
        Self {
            after: Some(after),
            before: Some(before),
        }
    }

    /// Whether `ticket` falls inside the bounds.
    #[must_use]
    pub fn contains(&self, ticket: TicketNumber) -> bool {
        self.after.is_none_or(|after| ticket > after)
            && self.before.is_none_or(|before| ticket < before)
    }
}

/// Ordering for "first matching ticket" lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Lowest ticket number first.
    Ascending,
    /// Highest ticket number first.
    Descending,
}

/// Snapshot returned by state reads, advances and resets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueState {
    /// Ticket currently being served (0 if none)
    pub current_ticket: TicketNumber,
    /// Highest ticket issued
    pub last_ticket: TicketNumber,
    /// Count of `WAITING` and `CALLED` entries
    pub length: u64,
}

impl QueueState {
    /// Combine the meta record with a freshly counted length.
    #[must_use]
    pub const fn new(meta: QueueMeta, length: u64) -> Self {
        Self {
            current_ticket: meta.current_ticket,
            last_ticket: meta.last_ticket,
            length,
        }
    }
}

/// Result of a successful join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReceipt {
    /// The newly issued ticket
    pub ticket: TicketNumber,
    /// Active tickets ahead of this one
    pub position: u64,
    /// Ticket being served at join time (unchanged by join)
    pub current_ticket: TicketNumber,
}

/// Result of a status lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStatusView {
    /// The ticket looked up
    pub ticket: TicketNumber,
    /// Its lifecycle status
    pub status: TicketStatus,
    /// Active tickets ahead of it; always 0 once `DONE`
    pub position: u64,
    /// Ticket being served right now
    pub current_ticket: TicketNumber,
}
