//! HTTP API for the voice assistant session
//!
//! The UI drives the conversation and relays speech recognizer output
//! through these routes, and follows the session over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::{ConversationHandle, RelaySpeechRecognizer};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: ConversationHandle,
    pub speech: Arc<RelaySpeechRecognizer>,
}

impl AppState {
    pub fn new(conversation: ConversationHandle, speech: Arc<RelaySpeechRecognizer>) -> Self {
        Self {
            conversation,
            speech,
        }
    }
}
