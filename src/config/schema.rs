//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the job tracker service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backing store connection settings.
    pub database: DatabaseConfig,

    /// HTTP timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Database connection configuration.
///
/// The connection URL itself is resolved on every connection attempt, see
/// [`DatabaseConfig::resolve_url`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL from the config file.
    pub url: Option<String>,

    /// Environment variable that overrides `url` when set and non-empty.
    pub url_env: String,

    /// Server selection timeout in seconds.
    pub server_selection_timeout_secs: u64,

    /// Socket idle timeout in seconds.
    pub socket_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Minimum number of pooled connections.
    pub min_pool_size: usize,

    /// Maximum number of pooled connections.
    pub max_pool_size: usize,

    /// Pooled connections idle longer than this are evicted, in seconds.
    pub max_idle_secs: u64,

    /// Interval between liveness probes, in seconds.
    pub heartbeat_secs: u64,

    /// Consecutive failed attempts after which autonomous retrying stops.
    pub max_retry_attempts: u32,

    /// Seed of the exponential backoff, in seconds.
    pub base_delay_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            url_env: "DATABASE_URL".to_string(),
            server_selection_timeout_secs: 10,
            socket_timeout_secs: 45,
            connect_timeout_secs: 10,
            min_pool_size: 2,
            max_pool_size: 10,
            max_idle_secs: 30,
            heartbeat_secs: 10,
            max_retry_attempts: 5,
            base_delay_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Resolve the connection target: the environment variable first, then
    /// the configured value. Blank values count as absent.
    pub fn resolve_url(&self) -> Option<String> {
        let from_env = std::env::var(&self.url_env).ok();
        from_env
            .into_iter()
            .chain(self.url.clone())
            .map(|u| u.trim().to_string())
            .find(|u| !u.is_empty())
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_secs(self.base_delay_secs)
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
