//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_db_connection_state` (gauge): 0=disconnected 1=connecting 2=connected 3=disconnecting
//! - `tracker_db_connect_attempts_total` (counter)
//! - `tracker_db_connect_failures_total` (counter): by failure kind
//! - `tracker_db_missing_target_total` (counter): attempts skipped for lack of a URL
//! - `tracker_db_retries_scheduled_total` (counter): by retry kind
//! - `tracker_http_degraded_responses_total` (counter): by reported state

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::database::{ConnectionState, FailureKind, RetryKind};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn set_connection_state(state: ConnectionState) {
    gauge!("tracker_db_connection_state").set(state as u8 as f64);
}

pub fn record_connect_attempt() {
    counter!("tracker_db_connect_attempts_total").increment(1);
}

pub fn record_connect_failure(kind: FailureKind) {
    counter!("tracker_db_connect_failures_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_missing_target() {
    counter!("tracker_db_missing_target_total").increment(1);
}

pub fn record_retry_scheduled(kind: RetryKind) {
    counter!("tracker_db_retries_scheduled_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_degraded_response(state: ConnectionState) {
    counter!("tracker_http_degraded_responses_total", "state" => state.as_str()).increment(1);
}
