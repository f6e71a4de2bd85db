//! Events emitted by a chat turn.

use crate::detection::DetectorCategory;
use crate::Result;
use serde::{Serialize, Serializer};

/// Caller-facing event of a turn.
///
/// A turn emits zero or more `Chunk`s followed by exactly one terminal event
/// (`Blocked`, `Done` or `Error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Model output, forwarded as soon as it cleared detection.
    Chunk(String),
    /// Refusal that replaces the rest of the answer.
    Blocked {
        message: String,
        category: DetectorCategory,
    },
    Done,
    /// Caller-safe failure text.
    Error(String),
}

impl OutputEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OutputEvent::Chunk(_))
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, OutputEvent::Blocked { .. })
    }

    /// Render as one Server-Sent-Events record: `data: <json>\n\n`.
    pub fn to_sse(&self) -> Result<String> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

/// Wire shape used by chat front ends: blocks travel as `error` records
/// carrying a `detector_type` so the UI can style them.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent<'a> {
    Chunk {
        content: &'a str,
    },
    Error {
        message: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        detector_type: Option<&'static str>,
    },
    Done,
}

impl Serialize for OutputEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            OutputEvent::Chunk(content) => WireEvent::Chunk { content },
            OutputEvent::Blocked { message, category } => WireEvent::Error {
                message,
                detector_type: Some(category.as_str()),
            },
            OutputEvent::Done => WireEvent::Done,
            OutputEvent::Error(message) => WireEvent::Error {
                message,
                detector_type: None,
            },
        };
        wire.serialize(serializer)
    }
}
