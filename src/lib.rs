//! Email agent chat client
//!
//! A conversation engine that sends free-text queries and email actions to
//! a chat service, keeping an append-only transcript with optimistic updates.

pub mod config;
pub mod engine;
pub mod message;
pub mod state_machine;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use engine::{
    ConversationEngine, ConversationSnapshot, EmailActionError, Notification, SendMessageError,
    SEND_EMAIL_ACTION,
};
pub use message::{Annotation, Author, Message, MessageContent, MessageId};
pub use transport::{
    EmailActionReply, EmailPayload, HttpTransport, LoggingTransport, QueryReply, Transport,
    TransportError,
};
