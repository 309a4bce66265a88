//! Decoded agent payloads
//!
//! One variant per response shape the agent backend produces. These are the
//! decoder's output and are only ever consumed by the normalizer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Preview actions
// ============================================================================

/// Action a presentation preview applies to a set of calendar records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Search,
    Update,
    Create,
    Delete,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Search,
        ActionKind::Update,
        ActionKind::Create,
        ActionKind::Delete,
    ];

    /// Key used for this action inside a preview object
    pub fn wire_key(self) -> &'static str {
        match self {
            ActionKind::Search => "search",
            ActionKind::Update => "update",
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
        }
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        ActionKind::ALL.into_iter().find(|action| action.wire_key() == key)
    }
}

/// A single preview: exactly one action over an ordered list of record ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewSpec {
    Search(Vec<String>),
    Update(Vec<String>),
    Create(Vec<String>),
    Delete(Vec<String>),
}

impl PreviewSpec {
    pub fn new(action: ActionKind, record_ids: Vec<String>) -> Self {
        match action {
            ActionKind::Search => PreviewSpec::Search(record_ids),
            ActionKind::Update => PreviewSpec::Update(record_ids),
            ActionKind::Create => PreviewSpec::Create(record_ids),
            ActionKind::Delete => PreviewSpec::Delete(record_ids),
        }
    }

    pub fn action(&self) -> ActionKind {
        match self {
            PreviewSpec::Search(_) => ActionKind::Search,
            PreviewSpec::Update(_) => ActionKind::Update,
            PreviewSpec::Create(_) => ActionKind::Create,
            PreviewSpec::Delete(_) => ActionKind::Delete,
        }
    }

    pub fn record_ids(&self) -> &[String] {
        match self {
            PreviewSpec::Search(ids)
            | PreviewSpec::Update(ids)
            | PreviewSpec::Create(ids)
            | PreviewSpec::Delete(ids) => ids,
        }
    }
}

/// A named preview entry, kept in the order the agent sent it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub key: String,
    pub spec: PreviewSpec,
}

// ============================================================================
// Plans
// ============================================================================

/// An event placed on a planned day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One day of a days plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub schedule: Vec<ScheduledEvent>,
}

/// A time slot proposed by a suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub day: String,
    pub name: String,
    pub start_time: String,
    pub end_time: String,
}

/// An alternative offered by a suggestion plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub is_recommended: bool,
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAdvice {
    pub title: String,
    pub text: String,
}

// ============================================================================
// Payload
// ============================================================================

/// Text and follow-up suggestions of a presentation reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredMessage {
    pub text: String,
    pub suggestions: Vec<String>,
}

/// Decoded response, one variant per agent shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponsePayload {
    /// Simple conversational agents
    PlainText { text: String },
    /// Presentation layer reply, optionally highlighting calendar records
    Structured {
        previews: Option<Vec<Preview>>,
        message: StructuredMessage,
    },
    DaysPlan {
        summary: String,
        days: Vec<DayPlan>,
    },
    SuggestionPlan {
        summary: String,
        suggestions: Vec<Suggestion>,
        general_advice: Option<GeneralAdvice>,
    },
}
