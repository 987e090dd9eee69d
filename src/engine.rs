//! Conversation engine
//!
//! Owns the message log, the busy flag and the last error. Each operation
//! runs the same cycle: feed a user event to the state machine, execute the
//! effects, await the one network exchange, then feed the outcome back in.

#[cfg(test)]
pub mod testing;

use crate::message::{Message, MessageContent, MessageId};
use crate::state_machine::{transition, ConvState, Effect, Event, Request, TransitionError};
use crate::transport::{EmailActionReply, EmailPayload, Transport, TransportError};
use chrono::Utc;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::broadcast;

/// Action name understood by the email endpoint
pub const SEND_EMAIL_ACTION: &str = "send_email";

const NOTIFICATION_CAPACITY: usize = 128;

/// Point-in-time copy of the conversation state for readers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub log: Vec<Message>,
    pub pending: bool,
    pub last_error: Option<TransportError>,
}

/// Change notifications, in the order the changes happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    MessageAppended { message: Message },
    PendingChanged { pending: bool },
    ErrorRecorded { error: TransportError },
    ErrorCleared,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailActionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl EmailActionError {
    /// The service failure, when that is what went wrong
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Transition(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    phase: ConvState,
    log: Vec<Message>,
    pending: bool,
    last_error: Option<TransportError>,
    next_id: u64,
}

impl Shared {
    fn append(&mut self, content: MessageContent) -> Message {
        self.next_id += 1;
        let message = Message {
            id: MessageId(self.next_id),
            content,
            created_at: Utc::now(),
        };
        self.log.push(message.clone());
        message
    }
}

/// Client-side conversation over any [`Transport`]
pub struct ConversationEngine<T: Transport> {
    conversation_id: String,
    transport: T,
    shared: Mutex<Shared>,
    /// Held for the whole of an operation so operations never interleave
    turn: tokio::sync::Mutex<()>,
    notify_tx: broadcast::Sender<Notification>,
}

impl<T: Transport> ConversationEngine<T> {
    pub fn new(transport: T) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            conversation_id: uuid::Uuid::new_v4().to_string(),
            transport,
            shared: Mutex::new(Shared::default()),
            turn: tokio::sync::Mutex::new(()),
            notify_tx,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let shared = self.lock_shared();
        ConversationSnapshot {
            log: shared.log.clone(),
            pending: shared.pending,
            last_error: shared.last_error.clone(),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock_shared().log.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.lock_shared().pending
    }

    pub fn last_error(&self) -> Option<TransportError> {
        self.lock_shared().last_error.clone()
    }

    pub fn phase(&self) -> ConvState {
        self.lock_shared().phase.clone()
    }

    /// Send free text and append the analysed reply.
    ///
    /// Service failures end up in the transcript and in `last_error`; they
    /// are not returned.
    ///
    /// # Errors
    /// [`SendMessageError::EmptyMessage`] for blank input, leaving the
    /// conversation untouched.
    pub async fn send_message(&self, text: &str) -> Result<(), SendMessageError> {
        if text.trim().is_empty() {
            return Err(SendMessageError::EmptyMessage);
        }

        let _turn = self.turn.lock().await;
        let request = self.apply(Event::UserQuery {
            text: text.to_string(),
        })?;
        let _reset = PendingReset { engine: self };

        let completion = self.dispatch(issued(request)?).await;
        self.apply(completion)?;
        Ok(())
    }

    /// Run an email action, showing a placeholder while it is in flight.
    ///
    /// # Errors
    /// The normalized service error, after it has been recorded and shown.
    pub async fn send_email_action(
        &self,
        action: &str,
        payload: EmailPayload,
    ) -> Result<EmailActionReply, EmailActionError> {
        let _turn = self.turn.lock().await;
        let request = self.apply(Event::EmailRequested {
            action: action.to_string(),
            payload,
        })?;
        let _reset = PendingReset { engine: self };

        let completion = self.dispatch(issued(request)?).await;
        let outcome = match &completion {
            Event::EmailCompleted(reply) => Ok(reply.clone()),
            Event::EmailFailed(error) => Err(EmailActionError::Transport(error.clone())),
            other => Err(EmailActionError::Transition(
                TransitionError::InvalidTransition(format!("Unexpected completion {other:?}")),
            )),
        };
        self.apply(completion)?;
        outcome
    }

    /// [`send_email_action`](Self::send_email_action) with the standard
    /// `send_email` action.
    ///
    /// # Errors
    /// See [`send_email_action`](Self::send_email_action).
    pub async fn send_email(&self, payload: EmailPayload) -> Result<EmailActionReply, EmailActionError> {
        self.send_email_action(SEND_EMAIL_ACTION, payload).await
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one transition and execute its local effects. Returns the network
    /// request the transition asked for, if any.
    fn apply(&self, event: Event) -> Result<Option<Request>, TransitionError> {
        let mut notifications = Vec::new();
        let mut request = None;

        {
            let mut shared = self.lock_shared();
            let result = transition(&shared.phase, event).inspect_err(|e| {
                tracing::warn!(conv_id = %self.conversation_id, error = %e, "Transition rejected");
            })?;

            tracing::debug!(
                conv_id = %self.conversation_id,
                from = ?shared.phase,
                to = ?result.new_state,
                "Phase transition"
            );
            shared.phase = result.new_state;

            for effect in result.effects {
                match effect {
                    Effect::AppendMessage(content) => {
                        let message = shared.append(content);
                        tracing::debug!(
                            conv_id = %self.conversation_id,
                            message_id = %message.id,
                            author = ?message.author(),
                            "Message appended"
                        );
                        notifications.push(Notification::MessageAppended { message });
                    }
                    Effect::SetPending(pending) => {
                        if shared.pending != pending {
                            shared.pending = pending;
                            notifications.push(Notification::PendingChanged { pending });
                        }
                    }
                    Effect::ClearError => {
                        if shared.last_error.take().is_some() {
                            notifications.push(Notification::ErrorCleared);
                        }
                    }
                    Effect::RecordError(error) => {
                        shared.last_error = Some(error.clone());
                        notifications.push(Notification::ErrorRecorded { error });
                    }
                    Effect::Submit(r) => request = Some(r),
                }
            }
        }

        self.publish(notifications);
        Ok(request)
    }

    async fn dispatch(&self, request: Request) -> Event {
        match request {
            Request::Query { text } => match self.transport.submit_query(&text).await {
                Ok(reply) => {
                    tracing::info!(conv_id = %self.conversation_id, "Query answered");
                    Event::QueryReplied(reply)
                }
                Err(error) => Event::QueryFailed(error),
            },
            Request::EmailAction { action, payload } => {
                match self.transport.submit_email_action(&action, &payload).await {
                    Ok(reply) => {
                        tracing::info!(conv_id = %self.conversation_id, action = %action, "Email action completed");
                        Event::EmailCompleted(reply)
                    }
                    Err(error) => Event::EmailFailed(error),
                }
            }
        }
    }

    fn publish(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            // No subscribers is fine
            let _ = self.notify_tx.send(notification);
        }
    }
}

fn issued(request: Option<Request>) -> Result<Request, TransitionError> {
    request.ok_or_else(|| TransitionError::InvalidTransition("User event issued no request".to_string()))
}

/// Lowers the busy flag when an operation ends, however it ends.
struct PendingReset<'a, T: Transport> {
    engine: &'a ConversationEngine<T>,
}

impl<T: Transport> Drop for PendingReset<'_, T> {
    fn drop(&mut self) {
        let released = {
            let mut shared = self.engine.lock_shared();
            shared.phase = ConvState::Idle;
            std::mem::replace(&mut shared.pending, false)
        };
        if released {
            tracing::warn!(conv_id = %self.engine.conversation_id, "Operation abandoned before completion");
            self.engine
                .publish(vec![Notification::PendingChanged { pending: false }]);
        }
    }
}
