//! GET /health: reachability of the inference and embedding endpoints.

use ai_llm_service::health_service::HealthStatus;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub endpoints: Vec<HealthStatus>,
}

/// 200 when every endpoint is healthy, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let endpoints = match &state.llm {
        Some(llm) => llm.health_all().await,
        None => Vec::new(),
    };
    let ok = endpoints.iter().all(|s| s.ok);
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse { ok, endpoints }))
}
