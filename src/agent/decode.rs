//! Envelope decoding
//!
//! Resolves the two-level discriminator: the envelope's agent name picks the
//! payload shape, and plan agents carry a second `response_type` tag inside
//! their payload. Both levels are closed enums matched exhaustively.

use super::error::DecodeError;
use super::payload::{ActionKind, AgentResponsePayload, Preview, PreviewSpec, StructuredMessage};
use super::wire::{
    AgentResponseEnvelope, DaysPlanWire, PlanHeader, StructuredWire, SuggestionPlanWire,
};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::Value;

/// Payload family of a known agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Replies with a bare JSON string
    PlainText,
    /// `PresentationLayer`: message plus record previews
    Presentation,
    /// Tactic/strategy planners, tagged by `response_type`
    Plan,
}

impl AgentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ConversationAgent" | "CalendarAgent" | "GreetingAgent" | "FallbackAgent" => {
                Some(AgentKind::PlainText)
            }
            "PresentationLayer" => Some(AgentKind::Presentation),
            "TacticAgent" | "StrategyAgent" => Some(AgentKind::Plan),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanType {
    DaysPlan,
    SuggestionPlan,
}

impl PlanType {
    fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "days_plan" => Some(PlanType::DaysPlan),
            "suggestion_plan" => Some(PlanType::SuggestionPlan),
            _ => None,
        }
    }
}

/// Parse a raw response body and decode it
pub fn decode_body(raw: &str) -> Result<AgentResponsePayload, DecodeError> {
    let envelope: AgentResponseEnvelope = serde_json::from_str(raw)
        .map_err(|e| DecodeError::MalformedEnvelope(e.to_string()))?;
    decode(envelope)
}

/// Decode an envelope into its payload variant
///
/// Pure: no I/O, no panics on any input.
pub fn decode(envelope: AgentResponseEnvelope) -> Result<AgentResponsePayload, DecodeError> {
    let AgentResponseEnvelope { agent, response } = envelope;

    let Some(kind) = AgentKind::from_name(&agent) else {
        return Err(DecodeError::UnknownAgentType(agent));
    };

    match kind {
        AgentKind::PlainText => {
            let text: String = parse(&agent, &response)?;
            Ok(AgentResponsePayload::PlainText { text })
        }
        AgentKind::Presentation => decode_structured(&agent, &response),
        AgentKind::Plan => decode_plan(agent, &response),
    }
}

fn decode_structured(
    agent: &str,
    response: &RawValue,
) -> Result<AgentResponsePayload, DecodeError> {
    let wire: StructuredWire = parse(agent, response)?;

    let previews = wire
        .previews
        .map(|entries| {
            entries
                .0
                .into_iter()
                .map(|(key, value)| decode_preview(key, value))
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(AgentResponsePayload::Structured {
        previews,
        message: StructuredMessage {
            text: wire.message.message,
            suggestions: wire.message.suggestions,
        },
    })
}

/// Decode one preview entry
///
/// Either the entry key is the action (`"delete": ["ev1"]`) or the entry is an
/// object naming exactly one action (`"p1": {"delete": ["ev1"]}`).
fn decode_preview(key: String, value: Value) -> Result<Preview, DecodeError> {
    let (action, ids) = match value {
        Value::Array(_) => match ActionKind::from_wire_key(&key) {
            Some(action) => (action, value),
            None => return Err(DecodeError::MalformedPreview { key }),
        },
        Value::Object(mut fields) => {
            let present: Vec<ActionKind> = ActionKind::ALL
                .into_iter()
                .filter(|action| fields.contains_key(action.wire_key()))
                .collect();
            let [action] = present[..] else {
                return Err(DecodeError::MalformedPreview { key });
            };
            let ids = fields.remove(action.wire_key()).unwrap_or(Value::Null);
            (action, ids)
        }
        _ => return Err(DecodeError::MalformedPreview { key }),
    };

    let Ok(record_ids) = serde_json::from_value::<Vec<String>>(ids) else {
        return Err(DecodeError::MalformedPreview { key });
    };

    Ok(Preview {
        key,
        spec: PreviewSpec::new(action, record_ids),
    })
}

fn decode_plan(agent: String, response: &RawValue) -> Result<AgentResponsePayload, DecodeError> {
    // A payload that isn't an object has no discriminator at all
    let tag = match serde_json::from_str::<PlanHeader>(response.get())
        .ok()
        .and_then(|header| header.response_type)
    {
        Some(Value::String(tag)) => tag,
        Some(other) => other.to_string(),
        None => String::new(),
    };

    match PlanType::from_wire(&tag) {
        Some(PlanType::DaysPlan) => {
            let wire: DaysPlanWire = parse(&agent, response)?;
            Ok(AgentResponsePayload::DaysPlan {
                summary: wire.summary,
                days: wire.days,
            })
        }
        Some(PlanType::SuggestionPlan) => {
            let wire: SuggestionPlanWire = parse(&agent, response)?;
            Ok(AgentResponsePayload::SuggestionPlan {
                summary: wire.summary,
                suggestions: wire.suggestions,
                general_advice: wire.general_advice,
            })
        }
        None => Err(DecodeError::UnknownPlanType {
            agent,
            plan_type: tag,
        }),
    }
}

fn parse<T: DeserializeOwned>(agent: &str, response: &RawValue) -> Result<T, DecodeError> {
    serde_json::from_str(response.get()).map_err(|e| DecodeError::InvalidPayload {
        agent: agent.to_string(),
        reason: e.to_string(),
    })
}
