//! Custom Axum extractors.
//!
//! - [`JsonBody`]: JSON request body where an empty body means "all defaults"
//! - [`TicketQuery`]: the `ticket` query parameter, digits only
//!
//! Both reject with an [`AppError`] so the response body matches every
//! other error.
//!
//! # Examples
//!
//! ```ignore
//! async fn join(JsonBody(request): JsonBody<JoinRequest>) -> Result<Json<JoinReceipt>, AppError> {
//!     // request.name is None for an empty body
//! }
//!
//! async fn status(TicketQuery(ticket): TicketQuery) -> Result<Json<TicketStatusView>, AppError> {
//!     // ticket is a parsed TicketNumber
//! }
//! ```

use crate::error::AppError;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{Uri, request::Parts},
};
use serde::de::DeserializeOwned;
use ticket_queue_core::TicketNumber;

/// Message for bodies that are not valid JSON for the endpoint.
pub const INVALID_JSON_BODY: &str = "Invalid JSON body";

/// Message for a missing or malformed `ticket` query parameter.
pub const INVALID_TICKET_QUERY: &str = "ticket query parameter is required and must be an integer";

/// JSON request body.
///
/// An empty (or whitespace-only) body deserializes as `T::default()`.
/// Anything else must be valid JSON of the shape `T` expects; otherwise the
/// request is rejected with 400 `Invalid JSON body`. The `Content-Type`
/// header is not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            tracing::debug!(error = %e, "Rejected request body");
            AppError::bad_request(INVALID_JSON_BODY)
        })
    }
}

/// Ticket number from the `ticket` query parameter.
///
/// The query string is percent-decoded first; the decoded value must then be
/// non-empty ASCII digits. Signs, whitespace, decimals and values that
/// overflow are all rejected with 400. When the parameter repeats, the first
/// occurrence wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketQuery(pub TicketNumber);

#[async_trait]
impl<S> FromRequestParts<S> for TicketQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_ticket_query(&parts.uri)
            .map(Self)
            .ok_or_else(|| AppError::bad_request(INVALID_TICKET_QUERY))
    }
}

fn parse_ticket_query(uri: &Uri) -> Option<TicketNumber> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    let raw = pairs
        .into_iter()
        .find(|(key, _)| key == "ticket")
        .map(|(_, value)| value)?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>().ok().map(TicketNumber::new)
}
