use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::http::response::{not_found, DatabaseHealth, HealthReport};
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct ServiceIndex {
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn get_health(State(state): State<AppState>) -> HealthReport {
    HealthReport::from_snapshot(&state.manager.snapshot())
}

/// Kick off a connection attempt without waiting for it.
pub async fn post_connect(State(state): State<AppState>) -> (StatusCode, Json<DatabaseHealth>) {
    state.manager.trigger_connect();
    let snap = state.manager.snapshot();
    (StatusCode::ACCEPTED, Json(DatabaseHealth::from(&snap)))
}

pub async fn get_api_index() -> Json<ServiceIndex> {
    Json(ServiceIndex {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn fallback() -> Response {
    not_found()
}
