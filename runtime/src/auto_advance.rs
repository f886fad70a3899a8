//! Periodic auto-advance timer.
//!
//! `AutoAdvancer` calls [`QueueEngine::advance_if_possible`] once per
//! interval until it is told to stop. A tick that finds nobody waiting does
//! nothing; a tick that fails is logged and the loop carries on.
//!
//! ```text
//! loop {
//!     select:
//!         shutdown  => stop
//!         tick      => advance_if_possible
//!                        Ok(Some) → info
//!                        Ok(None) → debug
//!                        Err      → warn (never fatal)
//! }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let (shutdown_tx, _) = broadcast::channel(1);
//! let handle = AutoAdvancer::new(engine, Duration::from_secs(10), shutdown_tx.subscribe())
//!     .spawn();
//!
//! // Later
//! let _ = shutdown_tx.send(());
//! handle.await?;
//! ```

use crate::metrics::AutoAdvanceMetrics;
use std::time::Duration;
use ticket_queue_core::{QueueEngine, QueueState};
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// What a single timer tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A waiting ticket was called.
    Advanced(QueueState),
    /// Nobody was waiting above the current ticket. Nothing changed.
    Idle,
    /// The engine returned an error. It was logged and dropped.
    Failed,
}

impl TickOutcome {
    /// Label value for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Advanced(_) => "advanced",
            Self::Idle => "idle",
            Self::Failed => "failed",
        }
    }
}

/// Background task that advances the queue on a fixed period.
pub struct AutoAdvancer {
    engine: QueueEngine,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl AutoAdvancer {
    /// Create a timer over `engine`.
    ///
    /// A zero `interval` is raised to one second.
    #[must_use]
    pub fn new(engine: QueueEngine, interval: Duration, shutdown: broadcast::Receiver<()>) -> Self {
        Self {
            engine,
            interval: interval.max(Duration::from_secs(1)),
            shutdown,
        }
    }

    /// Tick period in effect.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the timer as a background task.
    ///
    /// The task runs until a shutdown signal arrives or the sender is
    /// dropped.
    #[must_use]
    pub fn spawn(mut self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&mut self) {
        info!(interval_secs = self.interval.as_secs(), "Auto-advance started");

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    info!("Auto-advance received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    tick(&self.engine).await;
                }
            }
        }

        info!("Auto-advance stopped");
    }
}

/// Run one auto-advance step against `engine`.
///
/// Never returns an error: failures are logged at `warn` and reported as
/// [`TickOutcome::Failed`].
pub async fn tick(engine: &QueueEngine) -> TickOutcome {
    let outcome = match engine.advance_if_possible().await {
        Ok(Some(state)) => {
            info!(
                current_ticket = %state.current_ticket,
                length = state.length,
                "Auto-advanced queue"
            );
            TickOutcome::Advanced(state)
        }
        Ok(None) => {
            debug!("Auto-advance tick: nobody waiting");
            TickOutcome::Idle
        }
        Err(e) => {
            warn!(error = %e, "Auto-advance tick failed");
            TickOutcome::Failed
        }
    };
    AutoAdvanceMetrics::record_tick(outcome.as_str());
    outcome
}
