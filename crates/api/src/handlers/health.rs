use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the job store is reachable.
    pub db_healthy: bool,
    /// Whether the broker is reachable.
    pub broker_healthy: bool,
}

/// GET /health -- returns service, job store and broker health.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = jobrelay_db::health_check(&state.pool).await.is_ok();
    let broker_healthy = state.dispatcher.broker().health_check().await.is_ok();

    let status = if db_healthy && broker_healthy {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        broker_healthy,
    })
}
