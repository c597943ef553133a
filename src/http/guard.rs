//! Database availability guard for API routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::Degraded;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Let the request through only while the database is connected.
pub async fn require_database(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if state.manager.status().is_ready() {
        return next.run(request).await;
    }

    let snap = state.manager.snapshot();
    // The link may have come up between the two reads.
    if snap.state.is_ready() {
        return next.run(request).await;
    }

    tracing::debug!(
        path = %request.uri().path(),
        database = %snap.state,
        "Rejecting request while database is unavailable"
    );
    metrics::record_degraded_response(snap.state);
    Degraded::from_snapshot(&snap).into_response()
}
