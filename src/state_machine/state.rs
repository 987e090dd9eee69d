//! Conversation phase types

use serde::Serialize;

/// Phase of the conversation between operations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// Ready for input
    #[default]
    Idle,

    /// A query was sent; waiting for the analysed reply
    AwaitingReply,

    /// An email action was sent; the placeholder is showing
    Drafting { to: String },
}

impl ConvState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConvState::Idle)
    }
}
