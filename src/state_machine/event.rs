//! Events that can occur in a conversation

use crate::agent::{AgentResponseContent, ResponseError};

/// Events that trigger state transitions
///
/// Asynchronous completions carry the generation they were started in.
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    ListenRequested {
        permission_granted: bool,
    },
    StopListening,
    SendText {
        text: String,
    },
    Dismiss,

    // Speech events
    SpeechReady {
        generation: u64,
    },
    SpeechFinal {
        generation: u64,
        text: String,
    },
    SpeechCancelled {
        generation: u64,
    },
    SpeechFailed {
        generation: u64,
        message: String,
    },

    // Agent events
    ResponseReceived {
        generation: u64,
        content: AgentResponseContent,
    },
    ResponseFailed {
        generation: u64,
        error: ResponseError,
    },

    // Timer events
    TimeoutFired {
        generation: u64,
    },
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::ListenRequested { .. } => "listen_requested",
            Event::StopListening => "stop_listening",
            Event::SendText { .. } => "send_text",
            Event::Dismiss => "dismiss",
            Event::SpeechReady { .. } => "speech_ready",
            Event::SpeechFinal { .. } => "speech_final",
            Event::SpeechCancelled { .. } => "speech_cancelled",
            Event::SpeechFailed { .. } => "speech_failed",
            Event::ResponseReceived { .. } => "response_received",
            Event::ResponseFailed { .. } => "response_failed",
            Event::TimeoutFired { .. } => "timeout_fired",
        }
    }
}
