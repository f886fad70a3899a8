//! End-to-end lifecycle: build, serve over a real socket, shut down.

#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use ticket_queue_server::{Application, Config};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

fn test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.database.url = "sqlite::memory:".to_string();
    config.auto_advance.enabled = false;
    config.server.shutdown_timeout = 2;
    config
}

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response
}

#[tokio::test]
async fn serves_requests_and_shuts_down_on_signal() {
    let app = Application::build(test_config()).await.expect("build");
    let addr = app.local_addr().expect("local addr");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_until(async move {
        let _ = stop_rx.await;
    }));

    let health = raw_request(
        addr,
        "GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(health.starts_with("HTTP/1.1 200"), "{health}");
    assert!(health.contains(r#"{"status":"ok"}"#), "{health}");

    let body = r#"{"name":"Alice"}"#;
    let join = raw_request(
        addr,
        &format!(
            "POST /queue/join HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ),
    )
    .await;
    assert!(join.starts_with("HTTP/1.1 200"), "{join}");
    assert!(join.contains(r#""ticket":1"#), "{join}");

    stop_tx.send(()).expect("server still running");
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("shutdown in time")
        .expect("server task");
    assert!(result.is_ok());
}

#[tokio::test]
async fn auto_advance_task_stops_with_the_server() {
    let mut config = test_config();
    config.auto_advance.enabled = true;
    config.auto_advance.interval_secs = 1;

    let app = Application::build(config).await.expect("build");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(app.run_until(async move {
        let _ = stop_rx.await;
    }));

    stop_tx.send(()).expect("server still running");
    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("shutdown in time")
        .expect("server task");
    assert!(result.is_ok());
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let mut config = test_config();
    config.server.port = taken.local_addr().expect("addr").port();

    let err = match Application::build(config).await {
        Ok(_) => panic!("port is already in use"),
        Err(err) => err,
    };
    assert!(err.to_string().starts_with("Failed to bind 127.0.0.1:"), "{err}");
}
