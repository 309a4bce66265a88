//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::agent::{AgentError, AgentResponseContent, DecodeError, ResponseError};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::default()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ConversationState> {
    prop_oneof![
        Just(ConversationState::Idle),
        Just(ConversationState::Listening),
        Just(ConversationState::Thinking),
        Just(ConversationState::Asking),
        Just(ConversationState::Result),
        Just(ConversationState::Error),
    ]
}

fn arb_session() -> impl Strategy<Value = Session> {
    (arb_state(), 0u64..20).prop_map(|(state, generation)| Session {
        state,
        generation,
        ..Session::default()
    })
}

fn arb_content() -> impl Strategy<Value = AgentResponseContent> {
    (
        "[a-zA-Z ]{1,30}",
        proptest::collection::vec("[a-z]{1,8}", 0..3),
        proptest::collection::vec("ev[0-9]{1,2}", 0..4),
    )
        .prop_map(|(main_text, suggestions, ids)| AgentResponseContent::TextMessage {
            main_text,
            suggestions,
            highlights: ids
                .into_iter()
                .map(|id| (id, crate::agent::ActionKind::Update))
                .collect::<BTreeMap<_, _>>(),
        })
}

fn arb_response_error() -> impl Strategy<Value = ResponseError> {
    prop_oneof![
        "[A-Za-z]{3,12}".prop_map(|name| DecodeError::UnknownAgentType(name).into()),
        Just(AgentError::network("offline").into()),
        (400u16..600).prop_map(|code| AgentError::server(code, "failed").into()),
    ]
}

/// Generations near the ones a short run produces, so stamps both match and miss
fn arb_generation() -> impl Strategy<Value = u64> {
    0u64..25
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        any::<bool>().prop_map(|permission_granted| Event::ListenRequested { permission_granted }),
        Just(Event::StopListening),
        "[a-zA-Z ]{0,20}".prop_map(|text| Event::SendText { text }),
        Just(Event::Dismiss),
        arb_generation().prop_map(|generation| Event::SpeechReady { generation }),
        (arb_generation(), "[a-zA-Z ]{0,20}")
            .prop_map(|(generation, text)| Event::SpeechFinal { generation, text }),
        arb_generation().prop_map(|generation| Event::SpeechCancelled { generation }),
        (arb_generation(), "[a-z ]{1,20}")
            .prop_map(|(generation, message)| Event::SpeechFailed { generation, message }),
        (arb_generation(), arb_content())
            .prop_map(|(generation, content)| Event::ResponseReceived { generation, content }),
        (arb_generation(), arb_response_error())
            .prop_map(|(generation, error)| Event::ResponseFailed { generation, error }),
        arb_generation().prop_map(|generation| Event::TimeoutFired { generation }),
    ]
}

// ============================================================================
// Validity Checkers
// ============================================================================

fn is_valid_session(session: &Session) -> bool {
    match session.state {
        ConversationState::Idle | ConversationState::Listening | ConversationState::Thinking => {
            session.content.is_none()
        }
        ConversationState::Result | ConversationState::Asking => session
            .content
            .as_ref()
            .is_some_and(|c| !c.is_error() && c.main_text() == session.main_text),
        ConversationState::Error => session.content.as_ref().is_some_and(|c| c.is_error()),
    }
}

fn effects_are_valid(effects: &[Effect], new: &Session, ctx: &ConvContext) -> bool {
    effects.iter().all(|effect| match effect {
        Effect::StartSpeech { generation } => {
            new.state == ConversationState::Listening && *generation == new.generation
        }
        Effect::SendToAgent { generation, text } => {
            new.state == ConversationState::Thinking
                && *generation == new.generation
                && !text.trim().is_empty()
        }
        Effect::ScheduleTimeout { delay, generation } => {
            ctx.timeout_for(new.state) == Some(*delay) && *generation == new.generation
        }
        _ => true,
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid session and effects after any sequence of events
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut session = Session::default();
        let ctx = test_context();

        for event in events {
            if let Ok(result) = transition(&session, &ctx, event) {
                prop_assert!(
                    result.new_session.generation >= session.generation,
                    "Generation went backwards: {} -> {}",
                    session.generation,
                    result.new_session.generation
                );
                session = result.new_session;
                prop_assert!(is_valid_session(&session), "Invalid session: {:?}", session);
                prop_assert!(
                    effects_are_valid(&result.effects, &session, &ctx),
                    "Invalid effects for {:?}: {:?}",
                    session,
                    result.effects
                );
            }
        }
    }

    // Invariant 2: A timer from an earlier generation never has an effect
    #[test]
    fn prop_stale_timeout_is_noop(session in arb_session(), behind in 1u64..10) {
        prop_assume!(session.generation >= behind);
        let event = Event::TimeoutFired { generation: session.generation - behind };

        let result = transition(&session, &test_context(), event).unwrap();
        prop_assert_eq!(&result.new_session, &session);
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 3: Stale speech and network completions never have an effect
    #[test]
    fn prop_stale_completions_are_noop(
        session in arb_session(),
        behind in 1u64..10,
        content in arb_content(),
    ) {
        prop_assume!(session.generation >= behind);
        let stale = session.generation - behind;

        for event in [
            Event::SpeechFinal { generation: stale, text: "hello".to_string() },
            Event::SpeechCancelled { generation: stale },
            Event::ResponseReceived { generation: stale, content: content.clone() },
            Event::TimeoutFired { generation: stale },
        ] {
            let result = transition(&session, &test_context(), event).unwrap();
            prop_assert_eq!(&result.new_session, &session);
        }
    }

    // Invariant 4: Idle is always reachable by dismissing
    #[test]
    fn prop_dismiss_always_reaches_idle(session in arb_session()) {
        let result = transition(&session, &test_context(), Event::Dismiss).unwrap();
        prop_assert_eq!(result.new_session.state, ConversationState::Idle);
        prop_assert!(result.new_session.content.is_none());
        let armed = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::ScheduleTimeout { .. }));
        prop_assert!(!armed);
    }

    // Invariant 5: Leaving a presenting state by user action disarms its timer
    #[test]
    fn prop_leaving_presentation_cancels_timer(
        state in prop_oneof![Just(ConversationState::Result), Just(ConversationState::Asking)],
        generation in 1u64..20,
        event in prop_oneof![
            Just(Event::Dismiss),
            Just(Event::ListenRequested { permission_granted: true }),
            "[a-z]{1,10}".prop_map(|text| Event::SendText { text }),
        ],
    ) {
        let session = Session { state, generation, ..Session::default() };
        let result = transition(&session, &test_context(), event).unwrap();
        prop_assert_ne!(result.new_session.state, state);
        prop_assert!(result.effects.contains(&Effect::CancelTimeouts));
    }

    // Invariant 6: Every successful reply arms exactly one timer for its own generation
    #[test]
    fn prop_reply_arms_one_timer(generation in 0u64..20, content in arb_content()) {
        let session = Session {
            state: ConversationState::Thinking,
            generation,
            ..Session::default()
        };
        let result = transition(
            &session,
            &test_context(),
            Event::ResponseReceived { generation, content },
        )
        .unwrap();

        prop_assert!(result.new_session.state.is_presenting());
        let timers: Vec<_> = result
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::ScheduleTimeout { .. }))
            .collect();
        prop_assert_eq!(timers.len(), 1);
        prop_assert_eq!(
            timers[0],
            &Effect::ScheduleTimeout {
                delay: test_context().timeout_for(result.new_session.state).unwrap(),
                generation: generation + 1,
            }
        );
    }

    // Invariant 7: Every failure ends in Error with a message
    #[test]
    fn prop_failures_show_error(generation in 0u64..20, error in arb_response_error()) {
        let session = Session {
            state: ConversationState::Thinking,
            generation,
            ..Session::default()
        };
        let result = transition(
            &session,
            &test_context(),
            Event::ResponseFailed { generation, error },
        )
        .unwrap();
        prop_assert_eq!(result.new_session.state, ConversationState::Error);
        prop_assert!(!result.new_session.main_text.is_empty());
    }
}
