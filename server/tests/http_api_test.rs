//! HTTP API tests.
//!
//! Requests go straight into the router with `oneshot`; no socket is bound.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use std::sync::Arc;
use ticket_queue_core::QueueEngine;
use ticket_queue_server::server::{AppState, build_router};
use ticket_queue_sqlite::SqliteQueueStore;
use ticket_queue_testing::{InMemoryQueueStore, QueueHarness, test_clock};
use tower::ServiceExt;

fn app() -> (Router, QueueHarness) {
    let harness = QueueHarness::new();
    let router = build_router(AppState::new(harness.engine.clone()));
    (router, harness)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::get(uri).body(Body::empty()).expect("request"),
    )
    .await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
    )
    .await
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();

    assert_eq!(
        get(&app, "/health").await,
        (StatusCode::OK, json!({"status": "ok"}))
    );
}

#[tokio::test]
async fn alice_and_bob_over_http() {
    let (app, _) = app();

    assert_eq!(
        post(&app, "/queue/join", r#"{"name": "Alice"}"#).await,
        (
            StatusCode::OK,
            json!({"ticket": 1, "position": 0, "current_ticket": 0})
        )
    );
    assert_eq!(
        post(&app, "/queue/join", r#"{"name": "Bob"}"#).await,
        (
            StatusCode::OK,
            json!({"ticket": 2, "position": 1, "current_ticket": 0})
        )
    );
    assert_eq!(
        post(&app, "/queue/next", "").await,
        (
            StatusCode::OK,
            json!({"current_ticket": 1, "last_ticket": 2, "length": 2})
        )
    );
    assert_eq!(
        get(&app, "/queue/status?ticket=2").await,
        (
            StatusCode::OK,
            json!({"ticket": 2, "status": "WAITING", "position": 0, "current_ticket": 1})
        )
    );
    assert_eq!(
        post(&app, "/queue/next", "").await,
        (
            StatusCode::OK,
            json!({"current_ticket": 2, "last_ticket": 2, "length": 1})
        )
    );
    assert_eq!(
        post(&app, "/queue/next", "").await,
        (
            StatusCode::OK,
            json!({"current_ticket": 2, "last_ticket": 2, "length": 0})
        )
    );
    assert_eq!(
        get(&app, "/queue/status?ticket=1").await,
        (
            StatusCode::OK,
            json!({"ticket": 1, "status": "DONE", "position": 0, "current_ticket": 2})
        )
    );
    assert_eq!(
        get(&app, "/queue/state").await,
        (
            StatusCode::OK,
            json!({"current_ticket": 2, "last_ticket": 2, "length": 0})
        )
    );
}

#[tokio::test]
async fn reset_returns_zeroed_state() {
    let (app, harness) = app();
    harness.join_all(["Ann", "Ben"]).await.expect("joins");

    assert_eq!(
        post(&app, "/queue/reset", "").await,
        (
            StatusCode::OK,
            json!({"current_ticket": 0, "last_ticket": 0, "length": 0})
        )
    );
    let (_, body) = post(&app, "/queue/join", r#"{"name": "Cat"}"#).await;
    assert_eq!(body["ticket"], 1);
}

#[tokio::test]
async fn join_rejects_bad_names() {
    let (app, harness) = app();
    let too_long = format!(r#"{{"name": "{}"}}"#, "x".repeat(65));

    for (body, message) in [
        ("", "name is required"),
        ("{}", "name is required"),
        (r#"{"name": null}"#, "name is required"),
        (r#"{"name": "   "}"#, "name is required"),
        (too_long.as_str(), "name is too long (max 64)"),
    ] {
        assert_eq!(
            post(&app, "/queue/join", body).await,
            (StatusCode::BAD_REQUEST, json!({"error": message})),
            "body {body:?}"
        );
    }

    assert!(harness.store.entries().await.is_empty());
}

#[tokio::test]
async fn join_rejects_malformed_bodies() {
    let (app, _) = app();

    for body in ["{", "[1, 2]", r#""Alice""#, r#"{"name": 5}"#] {
        assert_eq!(
            post(&app, "/queue/join", body).await,
            (StatusCode::BAD_REQUEST, json!({"error": "Invalid JSON body"})),
            "body {body:?}"
        );
    }
}

#[tokio::test]
async fn join_trims_the_name() {
    let (app, harness) = app();

    let (status, _) = post(&app, "/queue/join", r#"{"name": "  Alice  "}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.store.entries().await[0].name, "Alice");
}

#[tokio::test]
async fn status_requires_a_numeric_ticket() {
    let (app, _) = app();
    let expected = (
        StatusCode::BAD_REQUEST,
        json!({"error": "ticket query parameter is required and must be an integer"}),
    );

    for uri in [
        "/queue/status",
        "/queue/status?ticket=",
        "/queue/status?ticket=abc",
        "/queue/status?ticket=-1",
        "/queue/status?ticket=1.0",
    ] {
        assert_eq!(get(&app, uri).await, expected, "uri {uri}");
    }
}

#[tokio::test]
async fn status_accepts_a_percent_encoded_ticket() {
    let (app, harness) = app();
    harness.join_all(["Ann"]).await.expect("join");

    assert_eq!(
        get(&app, "/queue/status?ticket=%31").await,
        (
            StatusCode::OK,
            json!({"ticket": 1, "status": "WAITING", "position": 0, "current_ticket": 0})
        )
    );
}

#[tokio::test]
async fn status_of_unknown_ticket_is_not_found() {
    let (app, _) = app();

    assert_eq!(
        get(&app, "/queue/status?ticket=42").await,
        (StatusCode::NOT_FOUND, json!({"error": "ticket not found"}))
    );
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let (app, _) = app();

    assert_eq!(
        get(&app, "/queue/unknown").await,
        (StatusCode::NOT_FOUND, json!({"error": "not found"}))
    );
    assert_eq!(
        post(&app, "/nope", "").await,
        (StatusCode::NOT_FOUND, json!({"error": "not found"}))
    );
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let (app, _) = app();

    assert_eq!(
        get(&app, "/queue/join").await,
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({"error": "method not allowed"})
        )
    );
    assert_eq!(post(&app, "/queue/state", "").await.0, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn bare_options_gets_no_content() {
    let (app, _) = app();

    for uri in ["/queue/join", "/queue/status", "/health"] {
        let (status, body) = send(
            &app,
            Request::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT, "uri {uri}");
        assert_eq!(body, Value::Null, "uri {uri}");
    }
}

#[tokio::test]
async fn cors_headers_are_present() {
    let (app, _) = app();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/queue/join")
        .header(header::ORIGIN, "http://10.0.2.2")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(preflight).await.expect("infallible");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .expect("ascii");
    assert!(methods.contains("POST"));

    let request = Request::get("/queue/state")
        .header(header::ORIGIN, "http://10.0.2.2")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("infallible");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn missing_meta_is_an_internal_error() {
    let harness = QueueHarness::with_store(InMemoryQueueStore::without_meta());
    let app = build_router(AppState::new(harness.engine.clone()));

    let (status, body) = get(&app, "/queue/state").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error message");
    assert!(message.starts_with("internal error: "), "{message}");

    let (status, _) = post(&app, "/queue/join", r#"{"name": "Ann"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn sqlite_backed_router() {
    let store = SqliteQueueStore::in_memory().await.expect("open");
    store.migrate().await.expect("migrate");
    let engine = QueueEngine::new(Arc::new(store), Arc::new(test_clock()));
    let app = build_router(AppState::new(engine));

    let (status, body) = post(&app, "/queue/join", r#"{"name": "Alice"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"], 1);

    let (_, body) = post(&app, "/queue/next", "").await;
    assert_eq!(body["current_ticket"], 1);

    assert_eq!(
        get(&app, "/queue/status?ticket=1").await,
        (
            StatusCode::OK,
            json!({"ticket": 1, "status": "CALLED", "position": 0, "current_ticket": 1})
        )
    );
}
