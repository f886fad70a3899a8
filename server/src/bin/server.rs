//! Ticket Queue Server
//!
//! Main server process. It opens the queue database, starts the
//! auto-advance timer and serves the HTTP API until Ctrl+C or SIGTERM.
//!
//! # Usage
//!
//! ```bash
//! EQ_PORT=8080 EQ_DB=./queue.db cargo run --bin server
//! ```

use ticket_queue_server::{Application, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_queue=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ticket queue server...");

    let config = Config::from_env();
    tracing::info!(
        address = %config.bind_address(),
        database = %config.database.url,
        auto_advance = config.auto_advance.enabled,
        advance_seconds = config.auto_advance.interval_secs,
        metrics = ?config.metrics_address(),
        "Configuration loaded"
    );

    let app = Application::build(config).await?;
    tracing::info!("Press Ctrl+C to shutdown");

    app.run().await?;
    Ok(())
}
