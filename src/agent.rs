//! Agent response protocol
//!
//! Receive-only: envelopes are decoded into typed payloads, then normalized
//! into the content the conversation shows.

mod content;
mod decode;
mod error;
mod http;
mod payload;
mod wire;

#[cfg(test)]
mod proptests;

pub use content::{normalize, normalize_result, AgentResponseContent};
pub use decode::decode_body;
pub use error::{AgentError, ResponseError};
pub use http::HttpAgentClient;

#[cfg(test)]
pub use error::DecodeError;
#[cfg(test)]
pub use payload::ActionKind;
