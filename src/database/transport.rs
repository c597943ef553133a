//! Transport abstraction consumed by the connection manager.
//!
//! A transport establishes the physical connection to the backing store and
//! publishes readiness changes on a broadcast channel. The manager subscribes
//! once and mirrors what it hears.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::DatabaseConfig;
use crate::resilience::DeadlineExceeded;

/// Connection parameters handed to the transport on each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub server_selection_timeout: Duration,
    pub socket_timeout: Duration,
    pub connect_timeout: Duration,
    pub min_pool_size: usize,
    pub max_pool_size: usize,
    pub max_idle: Duration,
    pub heartbeat_interval: Duration,
}

impl From<&DatabaseConfig> for ConnectOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            server_selection_timeout: Duration::from_secs(config.server_selection_timeout_secs),
            socket_timeout: Duration::from_secs(config.socket_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            min_pool_size: config.min_pool_size,
            max_pool_size: config.max_pool_size,
            max_idle: Duration::from_secs(config.max_idle_secs),
            heartbeat_interval: Duration::from_secs(config.heartbeat_secs),
        }
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::from(&DatabaseConfig::default())
    }
}

/// Readiness notifications published by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
    /// A transient problem that does not by itself change readiness.
    Error(TransportError),
}

/// Coarse failure categories, used to pick a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NameResolution,
    Authentication,
    Timeout,
    AccessControl,
    Unclassified,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NameResolution => "name_resolution",
            FailureKind::Authentication => "authentication",
            FailureKind::Timeout => "timeout",
            FailureKind::AccessControl => "access_control",
            FailureKind::Unclassified => "unclassified",
        }
    }

    /// Operator-facing hint for this category.
    pub fn hint(self) -> &'static str {
        match self {
            FailureKind::NameResolution => "database host could not be resolved; check the hostname in the connection URL",
            FailureKind::Authentication => "credentials were rejected; check the username and password",
            FailureKind::Timeout => "database did not answer in time or refused the connection; check that it is running and reachable",
            FailureKind::AccessControl => "this host is not permitted to reach the database; check the network access list",
            FailureKind::Unclassified => "unexpected connection failure",
        }
    }

    /// Classify an opaque driver or OS error message.
    pub fn classify(message: &str) -> Self {
        let m = message.to_ascii_lowercase();
        if m.contains("enotfound") || m.contains("getaddrinfo") || m.contains("failed to lookup address") || m.contains("name or service not known") {
            FailureKind::NameResolution
        } else if m.contains("authentication failed") || m.contains("auth failed") || m.contains("bad auth") {
            FailureKind::Authentication
        } else if m.contains("etimedout") || m.contains("econnrefused") || m.contains("timed out") || m.contains("connection refused") {
            FailureKind::Timeout
        } else if m.contains("not authorized") || m.contains("whitelist") || m.contains("allowlist") || m.contains("permission denied") {
            FailureKind::AccessControl
        } else {
            FailureKind::Unclassified
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("could not resolve '{host}': {reason}")]
    Resolve { host: String, reason: String },

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Deadline(#[from] DeadlineExceeded),

    #[error("connection refused by {0}")]
    Refused(String),

    #[error("access denied to {0}")]
    AccessDenied(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Resolve { .. } => FailureKind::NameResolution,
            TransportError::Authentication(_) => FailureKind::Authentication,
            TransportError::Deadline(_) | TransportError::Refused(_) => FailureKind::Timeout,
            TransportError::AccessDenied(_) => FailureKind::AccessControl,
            TransportError::InvalidUrl(_) => FailureKind::Unclassified,
            TransportError::Other(message) => FailureKind::classify(message),
        }
    }

    /// Map a socket error against `peer` into a transport error.
    pub fn from_io(peer: impl fmt::Display, err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::ConnectionRefused => TransportError::Refused(peer.to_string()),
            ErrorKind::PermissionDenied => TransportError::AccessDenied(peer.to_string()),
            _ => TransportError::Other(format!("{peer}: {err}")),
        }
    }
}

/// The capability the connection manager drives.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establish the connection. Readiness changes are published as events;
    /// the returned result only reports whether this attempt worked.
    async fn connect(&self, url: &str, options: &ConnectOptions) -> Result<(), TransportError>;

    /// Subscribe to readiness events.
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Tear the connection down.
    async fn close(&self);
}

/// Strip any password from a connection URL before it is logged.
pub fn redact_url(raw: &str) -> String {
    let Some((scheme, rest)) = raw.split_once("://") else {
        return raw.to_string();
    };
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((userinfo, hosts)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:****@{hosts}{tail}")
        }
        None => raw.to_string(),
    }
}
