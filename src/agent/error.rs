//! Agent response error types

use thiserror::Error;

/// Why an envelope could not be turned into a payload
///
/// All of these are recoverable: the conversation shows them and returns to
/// idle. None is retried automatically since the cause is a shape mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("unknown agent type: {0}")]
    UnknownAgentType(String),
    #[error("unknown plan type '{plan_type}' from agent {agent}")]
    UnknownPlanType { agent: String, plan_type: String },
    #[error("malformed preview '{key}': expected exactly one of search, update, create, delete")]
    MalformedPreview { key: String },
    #[error("invalid {agent} payload: {reason}")]
    InvalidPayload { agent: String, reason: String },
}

/// Transport error reported by the agent client
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AgentError {
    pub kind: AgentErrorKind,
    pub message: String,
}

impl AgentError {
    pub fn new(kind: AgentErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::NetworkFailure, message)
    }

    pub fn server(code: u16, message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::ServerFailure(code), message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(AgentErrorKind::UnknownFailure, message)
    }
}

/// Error classification for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentErrorKind {
    /// Connection refused, DNS, timeouts
    NetworkFailure,
    /// Non-success HTTP status
    ServerFailure(u16),
    UnknownFailure,
}

/// Anything that prevents a send from producing content
#[derive(Debug, Clone, Error)]
pub enum ResponseError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Transport(#[from] AgentError),
}
