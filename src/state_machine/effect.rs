//! Effects produced by state transitions

use crate::message::MessageContent;
use crate::transport::{EmailPayload, TransportError};

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append an entry to the log
    AppendMessage(MessageContent),

    /// Raise or lower the busy flag
    SetPending(bool),

    /// Forget the previous operation's error
    ClearError,

    /// Remember a failure for readers of the conversation state
    RecordError(TransportError),

    /// Call the chat service; its outcome comes back as an event
    Submit(Request),
}

impl Effect {
    pub fn append_human(text: impl Into<String>) -> Self {
        Effect::AppendMessage(MessageContent::human(text))
    }

    pub fn append_assistant(text: impl Into<String>) -> Self {
        Effect::AppendMessage(MessageContent::assistant(text))
    }
}

/// Network exchange requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Query { text: String },
    EmailAction { action: String, payload: EmailPayload },
}
