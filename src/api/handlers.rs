//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, OkResponse, PermissionRequest, QueuedResponse, RelayResponse, SendRequest,
    SessionResponse,
};
use super::AppState;
use crate::runtime::{RuntimeError, SpeechEvent};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session
        .route("/api/session", get(get_session))
        .route("/api/session/stream", get(stream_session))
        // User actions
        .route("/api/session/listen", post(start_listening))
        .route("/api/session/stop", post(stop_listening))
        .route("/api/session/send", post(send_text))
        .route("/api/session/dismiss", post(dismiss))
        // Speech recognizer relay
        .route("/api/speech", post(relay_speech))
        .route("/api/speech/permission", post(set_permission))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session
// ============================================================

async fn get_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse {
        session: state.conversation.snapshot(),
    })
}

async fn stream_session(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so no change falls in between
    let broadcast_rx = state.conversation.subscribe();
    sse_stream(state.conversation.snapshot(), broadcast_rx)
}

// ============================================================
// User Actions
// ============================================================

async fn start_listening(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state.conversation.start_listening().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn stop_listening(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state.conversation.stop_listening().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn send_text(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    // Empty text is rejected by the conversation and reported over SSE
    state.conversation.send_text(req.text).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn dismiss(State(state): State<AppState>) -> Result<Json<QueuedResponse>, AppError> {
    state.conversation.dismiss().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

// ============================================================
// Speech Relay
// ============================================================

async fn relay_speech(
    State(state): State<AppState>,
    Json(event): Json<SpeechEvent>,
) -> Json<RelayResponse> {
    let delivered = state.speech.relay(event);
    if !delivered {
        tracing::debug!("Speech event dropped, no active subscription");
    }
    Json(RelayResponse { delivered })
}

async fn set_permission(
    State(state): State<AppState>,
    Json(req): Json<PermissionRequest>,
) -> Json<OkResponse> {
    tracing::info!(granted = req.granted, "Microphone permission updated");
    state.speech.set_permission(req.granted);
    Json(OkResponse { ok: true })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("agent-session ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    Unavailable(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Stopped => AppError::Unavailable(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
