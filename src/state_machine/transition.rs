//! Pure state transition function

use super::{ConvState, Effect, Event, Request};
use crate::message::MessageContent;
use crate::transport::TransportError;
use thiserror::Error;

pub const QUERY_FAILURE_PREFIX: &str = "Sorry, I encountered an error: ";
pub const EMAIL_FAILURE_PREFIX: &str = "Failed to process email action: ";
pub const EMAIL_DONE_FALLBACK: &str = "Email action completed.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
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
    #[error("Conversation is busy with another request")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

pub fn drafting_placeholder(to: &str) -> String {
    format!("Drafting your email to {to}...")
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs and performs no
/// I/O. Each completion event yields exactly one assistant append and lowers
/// the busy flag.
pub fn transition(state: &ConvState, event: Event) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Queries
        // ============================================================

        // The human entry goes in before the service is asked anything
        (ConvState::Idle, Event::UserQuery { text }) => {
            Ok(TransitionResult::new(ConvState::AwaitingReply)
                .with_effect(Effect::append_human(text.clone()))
                .with_effect(Effect::SetPending(true))
                .with_effect(Effect::ClearError)
                .with_effect(Effect::Submit(Request::Query { text })))
        }

        (ConvState::AwaitingReply, Event::QueryReplied(reply)) => {
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::AppendMessage(MessageContent::annotated(
                    reply.content,
                    reply.annotations,
                )))
                .with_effect(Effect::SetPending(false)))
        }

        (ConvState::AwaitingReply, Event::QueryFailed(error)) => {
            Ok(failure(QUERY_FAILURE_PREFIX, error))
        }

        // ============================================================
        // Email actions
        // ============================================================

        (ConvState::Idle, Event::EmailRequested { action, payload }) => {
            let placeholder = drafting_placeholder(&payload.to);
            Ok(TransitionResult::new(ConvState::Drafting {
                to: payload.to.clone(),
            })
            .with_effects([
                Effect::SetPending(true),
                Effect::ClearError,
                Effect::append_assistant(placeholder),
                Effect::Submit(Request::EmailAction { action, payload }),
            ]))
        }

        (ConvState::Drafting { .. }, Event::EmailCompleted(reply)) => {
            let text = reply.summary().unwrap_or(EMAIL_DONE_FALLBACK).to_string();
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::append_assistant(text))
                .with_effect(Effect::SetPending(false)))
        }

        (ConvState::Drafting { .. }, Event::EmailFailed(error)) => {
            Ok(failure(EMAIL_FAILURE_PREFIX, error))
        }

        // ============================================================
        // Rejections
        // ============================================================

        (
            ConvState::AwaitingReply | ConvState::Drafting { .. },
            Event::UserQuery { .. } | Event::EmailRequested { .. },
        ) => Err(TransitionError::Busy),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with {}",
            event_name(&event)
        ))),
    }
}

/// The error is recorded and also shown in the transcript.
fn failure(prefix: &str, error: TransportError) -> TransitionResult {
    let notice = format!("{prefix}{}", error.message);
    TransitionResult::new(ConvState::Idle)
        .with_effect(Effect::RecordError(error))
        .with_effect(Effect::append_assistant(notice))
        .with_effect(Effect::SetPending(false))
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::UserQuery { .. } => "UserQuery",
        Event::EmailRequested { .. } => "EmailRequested",
        Event::QueryReplied(_) => "QueryReplied",
        Event::QueryFailed(_) => "QueryFailed",
        Event::EmailCompleted(_) => "EmailCompleted",
        Event::EmailFailed(_) => "EmailFailed",
    }
}
