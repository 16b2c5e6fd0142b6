use axum::extract::State;
use axum::{routing::get, Json, Router};
use idioms_db::repositories::IdiomInputRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the database answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Inputs waiting for the generation task; `null` when the database is down.
    pub pending_inputs: Option<i64>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pending_inputs = IdiomInputRepo::count(&state.pool).await.ok();
    let db_healthy = match pending_inputs {
        Some(_) => true,
        None => idioms_db::health_check(&state.pool).await.is_ok(),
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        pending_inputs,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
