//! Pure state transition function
//!
//! Given the same session, context and event it always produces the same
//! result, with no I/O. Stale events (older generation than the session) are
//! accepted and ignored rather than rejected.

use super::{ConvContext, ConversationState, Effect, Event, Session};
use crate::agent::{normalize_result, AgentResponseContent};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session) -> Self {
        Self {
            new_session: session,
            effects: vec![],
        }
    }

    /// Keep the current session as-is
    pub fn unchanged(session: &Session) -> Self {
        Self::new(session.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Already listening")]
    AlreadyListening,
    #[error("Cannot send an empty message")]
    EmptyMessage,
}

/// Pure transition function
pub fn transition(
    session: &Session,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    use ConversationState as S;

    let current = session.generation;

    match (session.state, event) {
        // ============================================================
        // User input
        // ============================================================
        (S::Listening, Event::ListenRequested { .. }) => Err(TransitionError::AlreadyListening),

        (_, Event::ListenRequested {
            permission_granted: false,
        }) => Ok(TransitionResult::unchanged(session).with_effect(Effect::NotifyPermissionRequired)),

        (state, Event::ListenRequested {
            permission_granted: true,
        }) => {
            let next = session.enter(S::Listening);
            let generation = next.generation;
            Ok(TransitionResult::new(next)
                .with_effects(leave(state))
                .with_effect(Effect::StartSpeech { generation })
                .with_effect(Effect::PublishState))
        }

        (S::Listening, Event::StopListening) => {
            Ok(TransitionResult::unchanged(session).with_effect(Effect::FinishSpeech))
        }
        (_, Event::StopListening) => Ok(TransitionResult::unchanged(session)),

        (_, Event::SendText { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }
        // Sending while thinking supersedes the request in flight
        (state, Event::SendText { text }) => Ok(start_request(session, state, text)),

        (S::Idle, Event::Dismiss) => Ok(TransitionResult::unchanged(session)),
        (state, Event::Dismiss) => Ok(TransitionResult::new(session.enter(S::Idle))
            .with_effects(leave(state))
            .with_effect(Effect::PublishState)),

        // ============================================================
        // Speech recognizer
        // ============================================================
        (S::Listening, Event::SpeechReady { generation }) if generation == current => {
            Ok(TransitionResult::unchanged(session))
        }

        (S::Listening, Event::SpeechFinal { generation, text }) if generation == current => {
            if text.trim().is_empty() {
                Ok(back_to_idle(session, S::Listening))
            } else {
                Ok(start_request(session, S::Listening, text))
            }
        }

        (S::Listening, Event::SpeechCancelled { generation }) if generation == current => {
            Ok(back_to_idle(session, S::Listening))
        }

        (S::Listening, Event::SpeechFailed { generation, message }) if generation == current => {
            let next = session
                .enter(S::Error)
                .with_content(AgentResponseContent::error(message));
            Ok(TransitionResult::new(next)
                .with_effects(leave(S::Listening))
                .with_effect(Effect::PublishState))
        }

        (
            _,
            Event::SpeechReady { .. }
            | Event::SpeechFinal { .. }
            | Event::SpeechCancelled { .. }
            | Event::SpeechFailed { .. },
        ) => Ok(TransitionResult::unchanged(session)),

        // ============================================================
        // Agent replies
        // ============================================================
        (S::Thinking, Event::ResponseReceived { generation, content }) if generation == current => {
            Ok(present(session, context, content))
        }

        (S::Thinking, Event::ResponseFailed { generation, error }) if generation == current => {
            Ok(present(session, context, normalize_result(Err(error))))
        }

        // Superseded or dismissed request
        (_, Event::ResponseReceived { .. } | Event::ResponseFailed { .. }) => {
            Ok(TransitionResult::unchanged(session))
        }

        // ============================================================
        // Timers
        // ============================================================
        (state, Event::TimeoutFired { generation })
            if state.is_presenting() && generation == current =>
        {
            Ok(TransitionResult::new(session.enter(S::Idle)).with_effect(Effect::PublishState))
        }

        (_, Event::TimeoutFired { .. }) => Ok(TransitionResult::unchanged(session)),
    }
}

/// Effects that tear down whatever `state` had running
fn leave(state: ConversationState) -> Vec<Effect> {
    match state {
        ConversationState::Listening => vec![Effect::ReleaseSpeech],
        ConversationState::Thinking => vec![Effect::AbortRequest],
        ConversationState::Result | ConversationState::Asking => vec![Effect::CancelTimeouts],
        ConversationState::Idle | ConversationState::Error => vec![],
    }
}

fn back_to_idle(session: &Session, from: ConversationState) -> TransitionResult {
    TransitionResult::new(session.enter(ConversationState::Idle))
        .with_effects(leave(from))
        .with_effect(Effect::PublishState)
}

fn start_request(session: &Session, from: ConversationState, text: String) -> TransitionResult {
    let next = session.enter(ConversationState::Thinking);
    let generation = next.generation;
    TransitionResult::new(next)
        .with_effects(leave(from))
        .with_effect(Effect::SendToAgent { text, generation })
        .with_effect(Effect::PublishState)
}

/// Show a reply: errors stay up until dismissed, everything else times out
fn present(
    session: &Session,
    context: &ConvContext,
    content: AgentResponseContent,
) -> TransitionResult {
    if content.is_error() {
        let next = session.enter(ConversationState::Error).with_content(content);
        return TransitionResult::new(next).with_effect(Effect::PublishState);
    }

    let state = context.follow_up.presenting_state(&content);
    let next = session.enter(state).with_content(content);
    let generation = next.generation;

    let result = TransitionResult::new(next);
    match context.timeout_for(state) {
        Some(delay) => result
            .with_effect(Effect::ScheduleTimeout { delay, generation })
            .with_effect(Effect::PublishState),
        None => result.with_effect(Effect::PublishState),
    }
}
