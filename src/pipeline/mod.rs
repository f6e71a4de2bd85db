//! Streaming pipeline: raw upstream bytes to logical SSE frames, plus the retry schedule.
//!
//! ```text
//! Raw Bytes → SseDecoder → SseFrame::{Data, Error} → DetectionClassifier
//!     │            │
//!   HTTP      line split,
//!             `event:` / `[DONE]` handling,
//!             JSON parse (noise skipped)
//! ```
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`decode`] | Incremental SSE line decoder |
//! | [`retry`] | Backoff schedule for upstream attempts |

pub mod decode;
pub mod retry;

pub use decode::{LineDecoder, SseDecoder};
pub use retry::{RetryConfig, RetryOperator};

use serde_json::Value;

/// One logical server-sent event carrying a JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// Regular `data:` payload (content delta and/or detections).
    Data(Value),
    /// `data:` payload that followed an `event: error` marker.
    Error(Value),
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
