//! Queue endpoints.
//!
//! Each handler makes exactly one engine call:
//! - POST /queue/join - Take a ticket
//! - GET /queue/state - Current ticket, last ticket and queue length
//! - GET /queue/status?ticket=N - One ticket's status and position
//! - POST /queue/next - Finish the current ticket and call the next one
//! - POST /queue/reset - Clear the queue

use crate::server::state::AppState;
use axum::{Json, extract::State};
use serde::Deserialize;
use ticket_queue_core::{JoinReceipt, QueueState, TicketStatusView};
use ticket_queue_web::{AppError, JsonBody, TicketQuery};

/// Request body for joining the queue.
///
/// An empty body, `{}` and `{"name": null}` all mean "no name" and are
/// rejected by the engine's name validation.
#[derive(Debug, Default, Deserialize)]
pub struct JoinRequest {
    /// Display name for the ticket holder
    #[serde(default)]
    pub name: Option<String>,
}

/// Take the next ticket.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/queue/join -d '{"name": "Alice"}'
/// ```
///
/// Response:
/// ```json
/// { "ticket": 1, "position": 0, "current_ticket": 0 }
/// ```
///
/// # Errors
///
/// 400 for a missing, blank or over-long name, or a body that is not a JSON
/// object of this shape.
pub async fn join_queue(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<JoinRequest>,
) -> Result<Json<JoinReceipt>, AppError> {
    let name = request.name.unwrap_or_default();
    let receipt = state.engine.join(&name).await?;
    Ok(Json(receipt))
}

/// Read the queue state.
///
/// # Errors
///
/// 500 if storage fails.
pub async fn queue_state(State(state): State<AppState>) -> Result<Json<QueueState>, AppError> {
    Ok(Json(state.engine.state().await?))
}

/// Look up one ticket.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/queue/status?ticket=2'
/// ```
///
/// Response:
/// ```json
/// { "ticket": 2, "status": "WAITING", "position": 0, "current_ticket": 1 }
/// ```
///
/// # Errors
///
/// 400 for a missing or non-numeric `ticket`, 404 for an unknown ticket.
pub async fn ticket_status(
    State(state): State<AppState>,
    TicketQuery(ticket): TicketQuery,
) -> Result<Json<TicketStatusView>, AppError> {
    Ok(Json(state.engine.status(ticket).await?))
}

/// Finish the current ticket and call the next one.
///
/// # Errors
///
/// 500 if storage fails.
pub async fn next_ticket(State(state): State<AppState>) -> Result<Json<QueueState>, AppError> {
    Ok(Json(state.engine.advance().await?))
}

/// Clear the queue and return the zeroed state.
///
/// # Errors
///
/// 500 if storage fails.
pub async fn reset_queue(State(state): State<AppState>) -> Result<Json<QueueState>, AppError> {
    Ok(Json(state.engine.reset().await?))
}
