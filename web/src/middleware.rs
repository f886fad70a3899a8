//! Router layers and fallbacks shared by every queue endpoint.
//!
//! - [`cors_layer`]: permissive CORS so browser clients on any origin work
//! - [`trace_layer`]: one `tracing` span per request, with status and latency
//! - [`not_found`] / [`method_not_allowed`]: JSON fallbacks for unmatched requests
//! - [`options_no_content`]: `OPTIONS` answers with 204 rather than 200
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use ticket_queue_web::middleware::{
//!     cors_layer, method_not_allowed, not_found, options_no_content, trace_layer,
//! };
//!
//! let app = Router::new()
//!     .route("/health", get(health_check).fallback(method_not_allowed))
//!     .fallback(not_found)
//!     .layer(cors_layer())
//!     .layer(axum::middleware::map_response(options_no_content))
//!     .layer(trace_layer());
//! ```

use crate::error::AppError;
use axum::http::{Method, StatusCode, header};
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// CORS for every response.
///
/// Any origin; methods `GET`, `POST` and `OPTIONS`; request header
/// `Content-Type`. Preflight requests are answered by the layer itself and
/// never reach a handler.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Request logging at `info` level.
#[must_use]
pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO))
}

/// Fallback for paths no route matches.
#[allow(clippy::unused_async)]
pub async fn not_found() -> AppError {
    AppError::not_found("not found")
}

/// Fallback for a known path with an unsupported method.
#[allow(clippy::unused_async)]
pub async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

/// Answer `OPTIONS` with an empty 204.
///
/// [`cors_layer`] replies to every `OPTIONS` request itself with 200 and the
/// CORS headers; this keeps those headers and switches the status. Install it
/// with `axum::middleware::map_response`, outside the CORS layer.
#[allow(clippy::unused_async)]
pub async fn options_no_content(method: Method, mut response: Response) -> Response {
    if method == Method::OPTIONS && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
