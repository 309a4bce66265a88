//! Content normalization
//!
//! Folds every payload variant, and every way a send can fail, into the one
//! content union the state machine and UI read.

use super::error::{AgentErrorKind, DecodeError, ResponseError};
use super::payload::{ActionKind, AgentResponsePayload, DayPlan, GeneralAdvice, Suggestion};
use serde::Serialize;
use std::collections::BTreeMap;

/// Normalized agent reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentResponseContent {
    TextMessage {
        main_text: String,
        suggestions: Vec<String>,
        /// Calendar record id -> action to highlight it with
        highlights: BTreeMap<String, ActionKind>,
    },
    DaysPlan {
        main_text: String,
        suggestions: Vec<String>,
        days: Vec<DayPlan>,
    },
    SuggestionPlan {
        main_text: String,
        suggestions: Vec<String>,
        items: Vec<Suggestion>,
        general_advice: Option<GeneralAdvice>,
    },
    #[serde(rename = "error")]
    ErrorContent { main_text: String },
}

impl AgentResponseContent {
    pub fn error(main_text: impl Into<String>) -> Self {
        AgentResponseContent::ErrorContent {
            main_text: main_text.into(),
        }
    }

    pub fn main_text(&self) -> &str {
        match self {
            AgentResponseContent::TextMessage { main_text, .. }
            | AgentResponseContent::DaysPlan { main_text, .. }
            | AgentResponseContent::SuggestionPlan { main_text, .. }
            | AgentResponseContent::ErrorContent { main_text } => main_text,
        }
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            AgentResponseContent::TextMessage { suggestions, .. }
            | AgentResponseContent::DaysPlan { suggestions, .. }
            | AgentResponseContent::SuggestionPlan { suggestions, .. } => suggestions,
            AgentResponseContent::ErrorContent { .. } => &[],
        }
    }

    /// Highlight index of a text message; `None` for every other variant
    #[cfg(test)]
    pub fn highlights(&self) -> Option<&BTreeMap<String, ActionKind>> {
        match self {
            AgentResponseContent::TextMessage { highlights, .. } => Some(highlights),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AgentResponseContent::ErrorContent { .. })
    }
}

/// Map a decoded payload to content. Total and deterministic.
pub fn normalize(payload: AgentResponsePayload) -> AgentResponseContent {
    match payload {
        AgentResponsePayload::PlainText { text } => AgentResponseContent::TextMessage {
            main_text: text,
            suggestions: Vec::new(),
            highlights: BTreeMap::new(),
        },
        AgentResponsePayload::Structured { previews, message } => {
            // Previews are in document order, so a record id listed twice keeps
            // the action of its last occurrence.
            let mut highlights = BTreeMap::new();
            for preview in previews.iter().flatten() {
                let action = preview.spec.action();
                for id in preview.spec.record_ids() {
                    highlights.insert(id.clone(), action);
                }
            }
            AgentResponseContent::TextMessage {
                main_text: message.text,
                suggestions: message.suggestions,
                highlights,
            }
        }
        AgentResponsePayload::DaysPlan { summary, days } => AgentResponseContent::DaysPlan {
            main_text: summary,
            suggestions: Vec::new(),
            days,
        },
        AgentResponsePayload::SuggestionPlan {
            summary,
            suggestions,
            general_advice,
        } => AgentResponseContent::SuggestionPlan {
            main_text: summary,
            suggestions: Vec::new(),
            items: suggestions,
            general_advice,
        },
    }
}

/// Normalize the outcome of a send, turning failures into error content
pub fn normalize_result(
    result: Result<AgentResponsePayload, ResponseError>,
) -> AgentResponseContent {
    match result {
        Ok(payload) => normalize(payload),
        Err(e) => AgentResponseContent::error(failure_text(&e)),
    }
}

/// Human-readable reason shown for a failed send
pub fn failure_text(error: &ResponseError) -> String {
    match error {
        ResponseError::Decode(DecodeError::UnknownAgentType(agent)) => {
            format!("I don't know how to handle a reply from {agent}.")
        }
        ResponseError::Decode(DecodeError::UnknownPlanType { agent, plan_type }) => {
            format!("{agent} sent an unsupported plan type '{plan_type}'.")
        }
        ResponseError::Decode(
            DecodeError::MalformedEnvelope(_)
            | DecodeError::MalformedPreview { .. }
            | DecodeError::InvalidPayload { .. },
        ) => "The assistant's reply could not be read.".to_string(),
        ResponseError::Transport(e) => match e.kind {
            AgentErrorKind::NetworkFailure => {
                "Network connection failed. Check your connection and try again.".to_string()
            }
            AgentErrorKind::ServerFailure(code) => {
                format!("The assistant service returned an error ({code}).")
            }
            AgentErrorKind::UnknownFailure => "Something went wrong. Please try again.".to_string(),
        },
    }
}
