//! API request and response types

use crate::state_machine::Session;
use serde::{Deserialize, Serialize};

/// Request to send typed text
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub text: String,
}

/// Microphone permission reported by the client
#[derive(Debug, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

/// Response with the current session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// Response for user actions
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Response for relayed speech events
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    /// False when no listening session was active to receive the event
    pub delivered: bool,
}

/// Response for permission updates
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
