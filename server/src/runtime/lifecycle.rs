//! Application lifecycle management and graceful shutdown.
//!
//! [`Application`] owns everything the process runs:
//!
//! 1. **Startup**: open and migrate the database, build the engine, bind
//!    listeners
//! 2. **Runtime**: serve HTTP, run the auto-advance timer and the metrics
//!    endpoint
//! 3. **Shutdown**: coordinate graceful termination of all tasks
//!
//! # Graceful Shutdown
//!
//! When a shutdown signal is received (Ctrl+C or SIGTERM):
//! 1. HTTP server stops accepting new connections and drains in-flight requests
//! 2. Shutdown signal broadcast to all background tasks
//! 3. Wait for each task to finish (bounded by `EQ_SHUTDOWN_TIMEOUT`)
//! 4. Clean exit
//!
//! # Example
//!
//! ```rust,ignore
//! let app = Application::build(Config::from_env()).await?;
//! app.run().await?;
//! ```

use crate::config::Config;
use crate::server::{AppState, build_router, metrics_router};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use ticket_queue_core::QueueEngine;
use ticket_queue_core::environment::SystemClock;
use ticket_queue_core::store::StoreError;
use ticket_queue_runtime::{AutoAdvancer, MetricsError, MetricsServer};
use ticket_queue_sqlite::SqliteQueueStore;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Errors that stop the server from starting or running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The database could not be opened or migrated.
    #[error("Queue storage error: {0}")]
    Store(#[from] StoreError),

    /// A listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested
        addr: String,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The metrics recorder could not be installed.
    #[error(transparent)]
    Metrics(#[from] MetricsError),

    /// The HTTP server failed while running.
    #[error("HTTP server error: {0}")]
    Serve(std::io::Error),
}

/// Metrics endpoint waiting to be served.
struct MetricsEndpoint {
    listener: TcpListener,
    router: Router,
}

/// Application runtime that manages all components.
///
/// Created by [`Application::build`], consumed by [`Application::run`].
pub struct Application {
    /// TCP listener for the HTTP server
    listener: TcpListener,

    /// Axum router with all routes configured
    app: Router,

    /// Timer that calls the next ticket, when enabled
    auto_advancer: Option<AutoAdvancer>,

    /// Prometheus scrape endpoint, when enabled
    metrics: Option<MetricsEndpoint>,

    /// Broadcast sender for the shutdown signal
    shutdown_tx: broadcast::Sender<()>,

    /// Application configuration
    config: Arc<Config>,
}

impl Application {
    /// Open storage, build the engine and bind every listener.
    ///
    /// Nothing is served until [`run`](Self::run) is called.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] if the database cannot be opened or migrated,
    /// a listener cannot be bound, or the metrics recorder cannot be installed.
    pub async fn build(config: Config) -> Result<Self, ServerError> {
        let store =
            SqliteQueueStore::connect(&config.database.url, config.database.max_connections)
                .await?;
        store.migrate().await?;
        info!(url = %config.database.url, "Queue database ready");

        let engine = QueueEngine::new(Arc::new(store), Arc::new(SystemClock));
        let (shutdown_tx, _) = broadcast::channel(1);

        let auto_advancer = if config.auto_advance.enabled {
            let advancer = AutoAdvancer::new(
                engine.clone(),
                config.advance_interval(),
                shutdown_tx.subscribe(),
            );
            info!(interval_secs = advancer.interval().as_secs(), "Auto-advance enabled");
            Some(advancer)
        } else {
            info!("Auto-advance disabled");
            None
        };

        let metrics = match config.metrics_address() {
            Some(addr) => Some(bind_metrics(&addr).await?),
            None => None,
        };

        let addr = config.bind_address();
        let listener = bind(&addr).await?;
        let app = build_router(AppState::new(engine));

        Ok(Self {
            listener,
            app,
            auto_advancer,
            metrics,
            shutdown_tx,
            config: Arc::new(config),
        })
    }

    /// Address the HTTP server is bound to.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run until Ctrl+C or SIGTERM, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the HTTP server fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Run until `signal` completes, then shut down gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Serve`] if the HTTP server fails.
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles: Vec<(&'static str, JoinHandle<()>)> = Vec::new();

        if let Some(advancer) = self.auto_advancer {
            info!("Starting auto-advance timer");
            handles.push(("auto-advance", advancer.spawn()));
        }

        if let Some(endpoint) = self.metrics {
            handles.push(("metrics", spawn_metrics(endpoint, self.shutdown_tx.subscribe())));
        }

        info!(address = %self.config.bind_address(), "HTTP server listening for requests");
        let served = axum::serve(self.listener, self.app)
            .with_graceful_shutdown(signal)
            .await;

        info!("HTTP server stopped, initiating graceful shutdown...");

        // Receivers may all be gone already; that is fine.
        let _ = self.shutdown_tx.send(());

        let timeout = self.config.shutdown_timeout();
        for (name, handle) in handles {
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => info!(task = name, "Background task stopped gracefully"),
                Ok(Err(e)) => warn!(task = name, error = %e, "Background task failed"),
                Err(_) => warn!(task = name, "Background task shutdown timed out"),
            }
        }

        served.map_err(ServerError::Serve)?;
        info!("Graceful shutdown complete");
        Ok(())
    }
}

async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

async fn bind_metrics(addr: &str) -> Result<MetricsEndpoint, ServerError> {
    let listener = bind(addr).await?;
    let local = listener.local_addr().map_err(MetricsError::from)?;

    let mut server = MetricsServer::new(local);
    server.start()?;
    let router = metrics_router(&server);

    Ok(MetricsEndpoint { listener, router })
}

fn spawn_metrics(endpoint: MetricsEndpoint, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stop = async move {
            let _ = shutdown.recv().await;
        };
        if let Err(e) = axum::serve(endpoint.listener, endpoint.router)
            .with_graceful_shutdown(stop)
            .await
        {
            error!(error = %e, "Metrics server failed");
        }
    })
}

/// Wait for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed, that signal is never delivered; the
/// other one still works.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
