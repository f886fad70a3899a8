//! Configuration management for the queue server.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unparseable values fall back to the default rather than aborting startup.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Queue database configuration
    pub database: DatabaseConfig,
    /// Background auto-advance configuration
    pub auto_advance: AutoAdvanceConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Metrics server port (Prometheus scraping); disabled when unset
    pub metrics_port: Option<u16>,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `sqlite:` URL or bare file path
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Auto-advance timer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAdvanceConfig {
    /// Whether the timer runs at all
    pub enabled: bool,
    /// Seconds between ticks (at least 1)
    pub interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            server: ServerConfig {
                host: lookup("EQ_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&lookup, "EQ_PORT").unwrap_or(8080),
                metrics_port: parse_var(&lookup, "EQ_METRICS_PORT"),
                shutdown_timeout: parse_var(&lookup, "EQ_SHUTDOWN_TIMEOUT").unwrap_or(10),
            },
            database: DatabaseConfig {
                url: lookup("EQ_DB").unwrap_or_else(|| "sqlite://queue.db".to_string()),
                max_connections: parse_var(&lookup, "EQ_DB_MAX_CONNECTIONS").unwrap_or(5),
            },
            auto_advance: AutoAdvanceConfig {
                enabled: lookup("EQ_AUTO_ADVANCE")
                    .is_none_or(|s| matches!(s.trim(), "1" | "true")),
                interval_secs: parse_var(&lookup, "EQ_ADVANCE_SECONDS").unwrap_or(10).max(1),
            },
        }
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Address the metrics server binds to, if enabled.
    #[must_use]
    pub fn metrics_address(&self) -> Option<String> {
        self.server
            .metrics_port
            .map(|port| format!("{}:{port}", self.server.host))
    }

    /// Auto-advance period.
    #[must_use]
    pub const fn advance_interval(&self) -> Duration {
        Duration::from_secs(self.auto_advance.interval_secs)
    }

    /// How long shutdown waits for background tasks.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
