//! Conversation state types

use crate::agent::AgentResponseContent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of one voice/text interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Nothing in progress; the only true rest state
    #[default]
    Idle,
    /// Speech recognizer is capturing the user
    Listening,
    /// Request in flight to the agent
    Thinking,
    /// Reply shown, waiting on a follow-up from the user
    Asking,
    /// Reply shown
    Result,
    /// Something failed; the message is shown until dismissed
    Error,
}

impl ConversationState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConversationState::Idle => "idle",
            ConversationState::Listening => "listening",
            ConversationState::Thinking => "thinking",
            ConversationState::Asking => "asking",
            ConversationState::Result => "result",
            ConversationState::Error => "error",
        }
    }

    /// States that are left by timeout
    pub fn is_presenting(self) -> bool {
        matches!(self, ConversationState::Result | ConversationState::Asking)
    }
}

/// Everything readers may observe about the conversation
///
/// Replaced wholesale on each transition, so a reader never sees a state
/// paired with another state's content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    pub state: ConversationState,
    /// Bumped on every state entry. Timers, speech subscriptions and requests
    /// carry the generation they were started in; anything stamped with an
    /// older generation is stale.
    pub generation: u64,
    pub main_text: String,
    pub content: Option<AgentResponseContent>,
}

impl Session {
    /// Enter `state` with a fresh generation and nothing presented
    pub(crate) fn enter(&self, state: ConversationState) -> Session {
        Session {
            state,
            generation: self.generation + 1,
            main_text: String::new(),
            content: None,
        }
    }

    pub(crate) fn with_content(mut self, content: AgentResponseContent) -> Session {
        self.main_text = content.main_text().to_string();
        self.content = Some(content);
        self
    }
}

/// Decides whether a reply expects a follow-up
///
/// The agent protocol has no explicit flag for this, so it is policy rather
/// than contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowUpPolicy {
    /// Replies offering suggestions ask; everything else is a plain result
    #[default]
    SuggestionsAsk,
    /// Never ask
    AlwaysResult,
}

impl FollowUpPolicy {
    pub fn presenting_state(self, content: &AgentResponseContent) -> ConversationState {
        match self {
            FollowUpPolicy::SuggestionsAsk if !content.suggestions().is_empty() => {
                ConversationState::Asking
            }
            FollowUpPolicy::SuggestionsAsk | FollowUpPolicy::AlwaysResult => {
                ConversationState::Result
            }
        }
    }
}

pub const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ASKING_TIMEOUT: Duration = Duration::from_secs(15);

/// Immutable configuration of a conversation
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub follow_up: FollowUpPolicy,
    /// How long a plain result stays up
    pub result_timeout: Duration,
    /// How long a question waits for an answer
    pub asking_timeout: Duration,
}

impl Default for ConvContext {
    fn default() -> Self {
        Self {
            follow_up: FollowUpPolicy::default(),
            result_timeout: DEFAULT_RESULT_TIMEOUT,
            asking_timeout: DEFAULT_ASKING_TIMEOUT,
        }
    }
}

impl ConvContext {
    /// Auto-dismiss delay for a presenting state
    pub fn timeout_for(&self, state: ConversationState) -> Option<Duration> {
        match state {
            ConversationState::Result => Some(self.result_timeout),
            ConversationState::Asking => Some(self.asking_timeout),
            _ => None,
        }
    }
}
