//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool bounds ordered)
//! - Check the database URL shape when one is configured
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - A missing database URL is not an error here; the connection manager
//!   reports it as a diagnostic on every attempt
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::database::tcp::parse_seed_hosts;

/// URL schemes the transport understands.
pub const SUPPORTED_SCHEMES: &[&str] = &["mongodb", "mongodb+srv", "tcp"];

/// Upper bound for `database.base_delay_secs` (one day).
pub const MAX_BASE_DELAY_SECS: u64 = 86_400;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("database.min_pool_size ({min}) exceeds database.max_pool_size ({max})")]
    PoolBounds { min: usize, max: usize },

    #[error("database.url is invalid: {0}")]
    DatabaseUrl(String),

    #[error("database.url scheme '{0}' is not supported")]
    UnsupportedScheme(String),

    #[error("{field} ({value}) exceeds the maximum of {max}")]
    TooLarge { field: &'static str, value: u64, max: u64 },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }

    let db = &config.database;
    let positive = [
        ("database.server_selection_timeout_secs", db.server_selection_timeout_secs),
        ("database.socket_timeout_secs", db.socket_timeout_secs),
        ("database.connect_timeout_secs", db.connect_timeout_secs),
        ("database.max_idle_secs", db.max_idle_secs),
        ("database.heartbeat_secs", db.heartbeat_secs),
        ("database.base_delay_secs", db.base_delay_secs),
        ("database.max_pool_size", db.max_pool_size as u64),
    ];
    for (name, value) in positive {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    if db.base_delay_secs > MAX_BASE_DELAY_SECS {
        errors.push(ValidationError::TooLarge {
            field: "database.base_delay_secs",
            value: db.base_delay_secs,
            max: MAX_BASE_DELAY_SECS,
        });
    }

    if db.min_pool_size > db.max_pool_size {
        errors.push(ValidationError::PoolBounds {
            min: db.min_pool_size,
            max: db.max_pool_size,
        });
    }

    if let Some(raw) = db.url.as_deref().filter(|u| !u.trim().is_empty()) {
        if let Err(e) = check_database_url(raw) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that a database URL names a supported scheme and at least one host.
///
/// Host lists (`db1:27017,db2:27017`) are accepted, so the check goes through
/// the transport's own seed parser rather than a single-host URL parser.
pub fn check_database_url(raw: &str) -> Result<(), ValidationError> {
    let scheme = raw
        .trim()
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| ValidationError::DatabaseUrl("missing scheme".into()))?;
    if !SUPPORTED_SCHEMES.contains(&scheme) {
        return Err(ValidationError::UnsupportedScheme(scheme.to_string()));
    }
    parse_seed_hosts(raw).map_err(|e| ValidationError::DatabaseUrl(e.to_string()))?;
    Ok(())
}
