//! Conversation state machine
//!
//! Pure state transitions in the Elm Architecture style: the transition
//! function decides, the engine executes the resulting effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Request};
pub use event::Event;
pub use state::ConvState;
pub use transition::{
    transition, TransitionError, TransitionResult, EMAIL_DONE_FALLBACK, EMAIL_FAILURE_PREFIX,
    QUERY_FAILURE_PREFIX,
};
