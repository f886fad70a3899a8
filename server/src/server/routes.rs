//! Router configuration for the queue server.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::queue;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use ticket_queue_runtime::MetricsServer;
use ticket_queue_web::handlers::health_check;
use ticket_queue_web::{cors_layer, method_not_allowed, not_found, options_no_content, trace_layer};

/// Build the complete Axum router.
///
/// ```text
/// GET  /health
/// POST /queue/join
/// GET  /queue/state
/// GET  /queue/status?ticket=<n>
/// POST /queue/next
/// POST /queue/reset
/// ```
///
/// Unknown paths return 404 and known paths with the wrong method return
/// 405, both with a JSON error body. `OPTIONS` on any path gets an empty 204
/// with the CORS headers. CORS and request tracing wrap every response,
/// fallbacks included.
pub fn build_router(state: AppState) -> Router {
    let queue_routes = Router::new()
        .route("/join", post(queue::join_queue).fallback(method_not_allowed))
        .route("/state", get(queue::queue_state).fallback(method_not_allowed))
        .route("/status", get(queue::ticket_status).fallback(method_not_allowed))
        .route("/next", post(queue::next_ticket).fallback(method_not_allowed))
        .route("/reset", post(queue::reset_queue).fallback(method_not_allowed));

    Router::new()
        .route("/health", get(health_check).fallback(method_not_allowed))
        .nest("/queue", queue_routes)
        .fallback(not_found)
        .layer(cors_layer())
        .layer(middleware::map_response(options_no_content))
        .layer(trace_layer())
        .with_state(state)
}

/// Router for the Prometheus scrape endpoint.
///
/// Serves `GET /metrics` from the recorder installed by `metrics`. When
/// another recorder was installed first the body is empty.
pub fn metrics_router(metrics: &MetricsServer) -> Router {
    let handle = metrics.handle().cloned();
    Router::new()
        .route(
            "/metrics",
            get(move || {
                let body = handle
                    .as_ref()
                    .map(|handle| handle.render())
                    .unwrap_or_default();
                async move { body }
            }),
        )
        .fallback(not_found)
}
