//! Conversation state machine
//!
//! Pure transitions in the Elm Architecture style: `transition` maps the
//! current session and one event to the next session plus the effects the
//! runtime must carry out. All I/O lives in the runtime.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConvContext, ConversationState, FollowUpPolicy, Session};
pub use transition::transition;
