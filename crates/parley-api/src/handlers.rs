//! Route handler functions.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use parley_core::{ChatReply, ChatRequest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub started_at: DateTime<Utc>,
    pub model: String,
}

/// POST /chat - answer one user message given the prior turns.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
        _ => ApiError::BadRequest(rejection.body_text()),
    })?;

    let text = request.text.trim();
    if text.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    if state.config.general.is_development() {
        debug!(text, history = ?request.history, "Chat request");
    }
    info!(
        chars = text.chars().count(),
        history_turns = request.history.len(),
        "Chat request received"
    );

    let reply = state.provider.complete(&request.history, text).await?;
    Ok(Json(ChatReply { reply }))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        started_at: state.started_at,
        model: state.provider.model().to_string(),
    })
}
