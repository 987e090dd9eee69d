//! Events that can occur in a conversation

use crate::transport::{EmailActionReply, EmailPayload, QueryReply, TransportError};

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // User events
    UserQuery {
        text: String,
    },
    EmailRequested {
        action: String,
        payload: EmailPayload,
    },

    // Service events
    QueryReplied(QueryReply),
    QueryFailed(TransportError),
    EmailCompleted(EmailActionReply),
    EmailFailed(TransportError),
}
