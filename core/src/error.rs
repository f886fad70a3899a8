//! Error taxonomy for queue operations.
//!
//! Each engine operation returns [`QueueError`]. The request layer maps
//! [`QueueError::kind`] to an HTTP status; the auto-advance timer logs and
//! discards whatever it gets.

use crate::store::StoreError;
use crate::types::{NameError, TicketNumber};
use thiserror::Error;

/// Errors returned by [`QueueEngine`](crate::QueueEngine) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The join name failed validation. Nothing was written.
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// No entry carries this ticket number.
    #[error("ticket not found")]
    TicketNotFound(TicketNumber),

    /// The meta singleton is missing: storage is uninitialised or corrupted.
    ///
    /// This is not recovered automatically.
    #[error("queue storage is unavailable: meta record is missing")]
    StoreUnavailable,

    /// Any other storage failure.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for QueueError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StoreUnavailable => Self::StoreUnavailable,
            other => Self::Store(other),
        }
    }
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad client input. No retry, no mutation.
    InvalidInput,
    /// Unknown ticket. No mutation.
    NotFound,
    /// Storage or consistency failure.
    Internal,
}

impl QueueError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) => ErrorKind::InvalidInput,
            Self::TicketNotFound(_) => ErrorKind::NotFound,
            Self::StoreUnavailable | Self::Store(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_meta_becomes_store_unavailable() {
        let err = QueueError::from(StoreError::StoreUnavailable);
        assert!(matches!(err, QueueError::StoreUnavailable));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn other_store_errors_are_wrapped() {
        let err = QueueError::from(StoreError::Database("disk I/O error".to_string()));
        assert!(matches!(err, QueueError::Store(StoreError::Database(_))));
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            QueueError::InvalidName(NameError::Empty).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            QueueError::TicketNotFound(TicketNumber::new(9)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn invalid_name_message_is_the_validation_message() {
        let err = QueueError::from(NameError::Empty);
        assert_eq!(err.to_string(), "name is required");
    }
}
