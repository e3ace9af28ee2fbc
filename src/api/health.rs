use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;

/// Health check response payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always true once the server answers.
    pub api: bool,
    /// Whether the database is reachable.
    pub db: bool,
}

/// GET /up -- reports API and database health; never fails.
pub async fn up(State(state): State<AppState>) -> Json<HealthStatus> {
    let db = state.db.ping();
    if !db {
        tracing::warn!("Health check: database unreachable");
    }
    Json(HealthStatus { api: true, db })
}
