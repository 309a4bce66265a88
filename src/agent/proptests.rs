//! Property-based tests for agent response decoding
//!
//! These tests verify that decoding holds up against arbitrary input:
//! - Unknown agent names are rejected by name, whatever the payload
//! - Known agents never panic on payloads of the wrong shape
//! - Unknown plan tags are rejected and carried in the error
//! - A single-action preview keeps its action and record ids

use super::decode::{decode_body, AgentKind};
use super::error::DecodeError;
use super::payload::{ActionKind, AgentResponsePayload, Preview, PreviewSpec};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Strategies
// ============================================================================

const KNOWN_AGENTS: [&str; 7] = [
    "ConversationAgent",
    "CalendarAgent",
    "GreetingAgent",
    "FallbackAgent",
    "PresentationLayer",
    "TacticAgent",
    "StrategyAgent",
];

/// Agent names outside the allow-list, including near misses
fn arb_unknown_agent() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{0,24}",
        proptest::sample::select(KNOWN_AGENTS.to_vec()).prop_map(str::to_lowercase),
        proptest::sample::select(KNOWN_AGENTS.to_vec()).prop_map(|name| format!("{name} ")),
    ]
    .prop_filter("must not be a known agent", |name| {
        AgentKind::from_name(name).is_none()
    })
}

/// Arbitrary JSON, nested a few levels deep
fn arb_json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _]{0,30}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            proptest::collection::btree_map(
                prop_oneof![
                    "[a-z_]{1,12}",
                    Just("response_type".to_string()),
                    Just("previews".to_string()),
                    Just("message".to_string()),
                ],
                inner,
                0..4,
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_action() -> impl Strategy<Value = ActionKind> {
    proptest::sample::select(ActionKind::ALL.to_vec())
}

fn envelope(agent: &str, response: &Value) -> String {
    json!({ "agent": agent, "response": response }).to_string()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Any name outside the allow-list → UnknownAgentType carrying that name
    #[test]
    fn prop_unknown_agent_is_rejected_by_name(
        agent in arb_unknown_agent(),
        response in arb_json_value(),
    ) {
        let result = decode_body(&envelope(&agent, &response));
        prop_assert_eq!(result, Err(DecodeError::UnknownAgentType(agent)));
    }

    /// Known agents with arbitrary payloads decode or fail, never panic
    #[test]
    fn prop_known_agent_never_panics(
        agent in proptest::sample::select(KNOWN_AGENTS.to_vec()),
        response in arb_json_value(),
    ) {
        let result = decode_body(&envelope(agent, &response));
        let unknown_agent = matches!(result, Err(DecodeError::UnknownAgentType(_)));
        prop_assert!(!unknown_agent);
    }

    /// Plan tags other than the two known ones → UnknownPlanType with the tag
    #[test]
    fn prop_unknown_plan_type_is_carried(
        agent in prop_oneof![Just("TacticAgent"), Just("StrategyAgent")],
        tag in "[a-z_]{0,20}".prop_filter("must not be a known plan type", |tag| {
            tag != "days_plan" && tag != "suggestion_plan"
        }),
    ) {
        let response = json!({ "response_type": tag, "summary": "s", "days": [], "suggestions": [] });
        let result = decode_body(&envelope(agent, &response));
        prop_assert_eq!(
            result,
            Err(DecodeError::UnknownPlanType { agent: agent.to_string(), plan_type: tag })
        );
    }

    /// A preview object naming one action keeps that action and its ids in order
    #[test]
    fn prop_single_action_preview_decodes(
        key in "p[0-9]{1,3}",
        action in arb_action(),
        ids in proptest::collection::vec("ev[0-9]{1,4}", 0..6),
    ) {
        let response = json!({
            "previews": { key.clone(): { action.wire_key(): ids.clone() } },
            "message": { "message": "ok" }
        });
        let payload = decode_body(&envelope("PresentationLayer", &response)).unwrap();

        let AgentResponsePayload::Structured { previews, .. } = payload else {
            return Err(TestCaseError::fail("Expected Structured payload"));
        };
        prop_assert_eq!(
            previews,
            Some(vec![Preview { key, spec: PreviewSpec::new(action, ids) }])
        );
    }
}
