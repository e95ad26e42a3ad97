//! Liveness probe.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use kasir_core::Clock;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Whether `SELECT 1` succeeded.
    pub database: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health-check", get(health_check))
}

/// Always answers 200 so the process counts as up; `database` carries the
/// storage state.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    if !database {
        tracing::warn!("Health check: database unreachable");
    }

    Json(HealthResponse {
        status: "ok",
        timestamp: state.clock.now(),
        database,
    })
}
