//! Prometheus metrics for the ticket queue.
//!
//! The engine records its counters and gauges through the `metrics` facade.
//! [`MetricsServer`] installs the Prometheus recorder behind that facade and
//! renders the scrape body; the server crate exposes it over HTTP.
//!
//! # Example
//!
//! ```rust,no_run
//! use ticket_queue_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//!
//! let body = server.render();
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Holds the recorder handle and the address the scrape endpoint should be
/// served on.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl fmt::Debug for MetricsServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsServer")
            .field("addr", &self.addr)
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

impl MetricsServer {
    /// Create a new metrics server.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address to bind to (e.g., `0.0.0.0:9090`)
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Address the scrape endpoint should listen on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Describe the queue metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the metrics exporter cannot be installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a
    /// warning, leaves [`handle`](Self::handle) empty and returns `Ok`.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                register_metrics();
                self.handle = Some(handle);
                tracing::info!(
                    addr = %self.addr,
                    "Metrics recorder installed - scrape at http://{}/metrics",
                    self.addr
                );
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "queue_tickets_issued_total",
        "Total number of tickets issued by join"
    );
    describe_counter!(
        "queue_advances_total",
        "Total number of advances, labelled by trigger (manual or auto)"
    );
    describe_counter!("queue_resets_total", "Total number of queue resets");
    describe_counter!(
        "queue_auto_advance_ticks_total",
        "Auto-advance timer ticks, labelled by outcome"
    );
    describe_gauge!(
        "queue_length",
        "Number of WAITING and CALLED tickets after the last mutation"
    );
    describe_gauge!(
        "queue_current_ticket",
        "Ticket currently being served (0 if none)"
    );
}

/// Auto-advance timer metrics recorder.
pub struct AutoAdvanceMetrics;

impl AutoAdvanceMetrics {
    /// Record one timer tick and what it did.
    pub fn record_tick(outcome: &'static str) {
        counter!("queue_auto_advance_ticks_total", "outcome" => outcome).increment(1);
    }
}
