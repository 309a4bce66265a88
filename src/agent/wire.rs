//! Wire shapes of agent responses
//!
//! Only what serde can't decode straight into payload types lives here.

use super::payload::{DayPlan, GeneralAdvice, Suggestion};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;
use serde_json::Value;
use std::fmt;

/// Outer envelope: an agent name plus an agent-specific payload
///
/// The payload stays unparsed until the agent name says what shape it has.
/// Created per network call and dropped once decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentResponseEnvelope {
    pub agent: String,
    pub response: Box<RawValue>,
}

#[cfg(test)]
impl AgentResponseEnvelope {
    pub fn new(agent: impl Into<String>, response: Box<RawValue>) -> Self {
        Self {
            agent: agent.into(),
            response,
        }
    }
}

/// Second-level discriminator of plan agents
///
/// Kept as a raw value so a tag of the wrong JSON type still reaches the
/// error message.
#[derive(Debug, Deserialize)]
pub(super) struct PlanHeader {
    #[serde(default)]
    pub response_type: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StructuredWire {
    #[serde(default)]
    pub previews: Option<PreviewEntries>,
    pub message: MessageWire,
}

#[derive(Debug, Deserialize)]
pub(super) struct MessageWire {
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DaysPlanWire {
    pub summary: String,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SuggestionPlanWire {
    pub summary: String,
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub general_advice: Option<GeneralAdvice>,
}

/// Raw preview entries in document order
///
/// Order decides which action wins when a record id shows up twice, so the
/// entries are collected into a list instead of a sorted map.
#[derive(Debug, Default)]
pub(super) struct PreviewEntries(pub Vec<(String, Value)>);

impl<'de> Deserialize<'de> for PreviewEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = PreviewEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of preview entries")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(PreviewEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
