//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::message::{Annotation, Author, MessageContent};
use crate::transport::{EmailActionReply, EmailPayload, ErrorOrigin, QueryReply, TransportError};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_busy_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::AwaitingReply),
        "[a-z]{1,8}@[a-z]{1,8}\\.com".prop_map(|to| ConvState::Drafting { to }),
    ]
}

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![Just(ConvState::Idle), arb_busy_state()]
}

fn arb_transport_error() -> impl Strategy<Value = TransportError> {
    prop_oneof![
        (400u16..600, "[a-zA-Z ]{1,40}")
            .prop_map(|(status, message)| TransportError::new(ErrorOrigin::Response, Some(status), message)),
        Just(TransportError::no_response()),
        "[a-zA-Z ]{1,40}".prop_map(|message| TransportError::dispatch(message)),
    ]
}

fn arb_query_reply() -> impl Strategy<Value = QueryReply> {
    (
        "[a-zA-Z ]{0,60}",
        prop::collection::vec(
            ("[a-z]{1,10}", "[A-Z]{3,8}").prop_map(|(text, label)| Annotation::new(text, label)),
            0..4,
        ),
    )
        .prop_map(|(content, annotations)| QueryReply { content, annotations })
}

fn arb_email_reply() -> impl Strategy<Value = EmailActionReply> {
    prop_oneof![
        Just(EmailActionReply::default()),
        "[a-zA-Z! ]{0,30}".prop_map(|summary| {
            serde_json::from_value(json!({"data": {"summary": summary}})).unwrap()
        }),
    ]
}

fn arb_payload() -> impl Strategy<Value = EmailPayload> {
    ("[a-z]{1,8}@[a-z]{1,8}\\.com", "[a-zA-Z ]{0,20}", "[a-zA-Z ]{0,80}")
        .prop_map(|(to, subject, body)| EmailPayload::new(to, subject, body))
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,50}".prop_map(|text| Event::UserQuery { text }),
        arb_payload().prop_map(|payload| Event::EmailRequested {
            action: "send_email".to_string(),
            payload
        }),
    ]
}

fn arb_completion_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_query_reply().prop_map(Event::QueryReplied),
        arb_transport_error().prop_map(Event::QueryFailed),
        arb_email_reply().prop_map(Event::EmailCompleted),
        arb_transport_error().prop_map(Event::EmailFailed),
    ]
}

fn appends(result: &TransitionResult) -> Vec<&MessageContent> {
    result
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::AppendMessage(content) => Some(content),
            _ => None,
        })
        .collect()
}

fn matches_phase(state: &ConvState, event: &Event) -> bool {
    matches!(
        (state, event),
        (ConvState::AwaitingReply, Event::QueryReplied(_) | Event::QueryFailed(_))
            | (ConvState::Drafting { .. }, Event::EmailCompleted(_) | Event::EmailFailed(_))
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn user_events_from_idle_raise_pending_and_submit(event in arb_user_event()) {
        let result = transition(&ConvState::Idle, event).unwrap();

        prop_assert!(!result.new_state.is_idle());
        prop_assert!(result.effects.contains(&Effect::SetPending(true)));
        prop_assert!(result.effects.contains(&Effect::ClearError));
        prop_assert_eq!(appends(&result).len(), 1);
        let submits = result.effects.iter().filter(|e| matches!(e, Effect::Submit(_))).count();
        prop_assert_eq!(submits, 1);
        prop_assert!(matches!(result.effects.last(), Some(Effect::Submit(_))));
    }

    #[test]
    fn queries_append_the_human_text_first(text in "[a-zA-Z0-9 ]{1,50}") {
        let result = transition(&ConvState::Idle, Event::UserQuery { text: text.clone() }).unwrap();
        let expected = Effect::append_human(text);
        prop_assert_eq!(result.effects.first(), Some(&expected));
    }

    #[test]
    fn user_events_while_busy_are_rejected(state in arb_busy_state(), event in arb_user_event()) {
        prop_assert_eq!(transition(&state, event).unwrap_err(), TransitionError::Busy);
    }

    #[test]
    fn completions_append_once_and_settle(state in arb_state(), event in arb_completion_event()) {
        let expected_ok = matches_phase(&state, &event);
        match transition(&state, event) {
            Ok(result) => {
                prop_assert!(expected_ok);
                prop_assert!(result.new_state.is_idle());
                let entries = appends(&result);
                prop_assert_eq!(entries.len(), 1);
                prop_assert_eq!(entries[0].author(), Author::Assistant);
                prop_assert!(matches!(result.effects.last(), Some(Effect::SetPending(false))));
                prop_assert!(!result.effects.iter().any(|e| matches!(e, Effect::Submit(_))));
            }
            Err(e) => {
                prop_assert!(!expected_ok);
                prop_assert!(matches!(e, TransitionError::InvalidTransition(_)), "unexpected {:?}", e);
            }
        }
    }

    #[test]
    fn failures_are_recorded_and_shown(error in arb_transport_error(), query in any::<bool>()) {
        let (state, event) = if query {
            (ConvState::AwaitingReply, Event::QueryFailed(error.clone()))
        } else {
            (ConvState::Drafting { to: "a@b.com".into() }, Event::EmailFailed(error.clone()))
        };
        let result = transition(&state, event).unwrap();

        prop_assert!(result.effects.contains(&Effect::RecordError(error.clone())));
        let entries = appends(&result);
        prop_assert!(entries[0].text().contains(&error.message));
    }

    #[test]
    fn email_placeholder_names_recipient(payload in arb_payload()) {
        let to = payload.to.clone();
        let result = transition(
            &ConvState::Idle,
            Event::EmailRequested { action: "send_email".into(), payload },
        )
        .unwrap();

        prop_assert_eq!(&result.new_state, &ConvState::Drafting { to: to.clone() });
        let entries = appends(&result);
        prop_assert_eq!(entries[0].text(), drafting_placeholder(&to));
    }

    #[test]
    fn email_success_text_is_summary_or_fallback(reply in arb_email_reply()) {
        let expected = reply.summary().unwrap_or(EMAIL_DONE_FALLBACK).to_string();
        let result = transition(&ConvState::Drafting { to: "a@b.com".into() }, Event::EmailCompleted(reply)).unwrap();
        let entries = appends(&result);
        prop_assert_eq!(entries[0].text(), expected.as_str());
        prop_assert!(!result.effects.iter().any(|e| matches!(e, Effect::RecordError(_))));
    }
}
