use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

// GET /api/health
#[derive(Serialize)]
pub struct HealthResponse {
    success: bool,
    message: &'static str,
    timestamp: String,
    environment: String,
    uptime: u64,
    version: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "StudioBook API is healthy",
        timestamp: Utc::now().to_rfc3339(),
        environment: state.config.environment.clone(),
        uptime: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
