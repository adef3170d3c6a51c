use super::state::AppState;
use crate::session::Intent;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent: Intent,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Forward an intent; the outcome shows up in later snapshots
fn forward(state: &AppState, intent: Intent) -> axum::response::Response {
    info!("Forwarding intent: {:?}", intent);

    match state.controller.send(intent) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(IntentResponse {
                intent,
                status: "accepted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to forward intent {:?}: {}", intent, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /assistant
/// Current session snapshot
pub async fn get_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.snapshot()))
}

/// POST /assistant/open
pub async fn open_assistant(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::Open)
}

/// POST /assistant/close
pub async fn close_assistant(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::Close)
}

/// POST /assistant/reconnect
pub async fn reconnect(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::Reconnect)
}

/// POST /assistant/mic/start
pub async fn start_mic(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::StartMic)
}

/// POST /assistant/mic/stop
pub async fn stop_mic(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::StopMic)
}

/// POST /assistant/speech/stop
pub async fn stop_speaking(State(state): State<AppState>) -> impl IntoResponse {
    forward(&state, Intent::StopSpeaking)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
