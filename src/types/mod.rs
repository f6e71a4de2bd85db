//! Core data types shared by the session, the transport and the caller.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`OutputEvent`] | What a turn emits to the caller |
//! | [`ChatTurn`] | One inbound user message |
//! | [`UpstreamRequest`] | The chat-completion-with-detection request body |
//! | [`DetectorsConfig`] | Per-direction detector selection sent upstream |

pub mod events;
pub mod request;

pub use events::OutputEvent;
pub use request::{ChatTurn, DetectorsConfig, UpstreamRequest};
