//! Response bodies.
//!
//! # Design Decisions
//! - Every body is JSON
//! - A request that needs the database while it is unavailable gets a
//!   structured 503 naming the connection state, never a transport error

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::database::{ConnectionSnapshot, ConnectionState, PendingRetry, RetryKind};

/// Pending timer as reported to clients.
#[derive(Debug, Serialize)]
pub struct RetryView {
    pub kind: RetryKind,
    pub delay_secs: u64,
    pub retry_in_secs: u64,
}

impl From<&PendingRetry> for RetryView {
    fn from(retry: &PendingRetry) -> Self {
        Self {
            kind: retry.kind,
            delay_secs: retry.delay.as_secs(),
            retry_in_secs: retry.remaining().as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub state: ConnectionState,
    pub retry_attempts: u32,
    pub max_retry_attempts: u32,
    pub pending_retry: Option<RetryView>,
}

impl From<&ConnectionSnapshot> for DatabaseHealth {
    fn from(snap: &ConnectionSnapshot) -> Self {
        Self {
            state: snap.state,
            retry_attempts: snap.retry_attempts,
            max_retry_attempts: snap.max_retry_attempts,
            pending_retry: snap.pending_retry.as_ref().map(RetryView::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

impl HealthReport {
    pub fn from_snapshot(snap: &ConnectionSnapshot) -> Self {
        Self {
            status: if snap.state.is_ready() { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseHealth::from(snap),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.database.state.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct DegradedBody {
    error: &'static str,
    database: ConnectionState,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

/// 503 returned to requests that need the database while it is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Degraded {
    pub state: ConnectionState,
    pub retry_after: Option<u64>,
}

impl Degraded {
    pub fn from_snapshot(snap: &ConnectionSnapshot) -> Self {
        Self {
            state: snap.state,
            retry_after: snap.pending_retry.as_ref().map(|r| r.remaining().as_secs().max(1)),
        }
    }

    fn message(&self) -> &'static str {
        match self.state {
            ConnectionState::Connecting => "Database connection is being established; retry shortly",
            ConnectionState::Disconnecting => "Database connection is closing",
            _ => "Database is unavailable",
        }
    }
}

impl IntoResponse for Degraded {
    fn into_response(self) -> Response {
        let body = DegradedBody {
            error: "service_degraded",
            database: self.state,
            message: self.message(),
            retry_after_secs: self.retry_after,
        };
        let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

/// JSON 404 for unknown routes.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not_found" })),
    )
        .into_response()
}
