//! # lemonade-guard
//!
//! Guardrail-enforcing streaming chat proxy core.
//!
//! A user's chat turn is checked locally, forwarded to a moderation/detection
//! orchestrator, and the model's answer is streamed back while the orchestrator's
//! verdicts are inspected. As soon as a detector flags the turn the stream is cut
//! and a refusal is emitted instead.
//!
//! ## Flow
//!
//! ```text
//! message -> LocalFilter -> UpstreamClient -> SseDecoder -> DetectionClassifier -> OutputEvent
//!              (block?)      (retry/backoff)   (frames)      (metrics, abort?)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use lemonade_guard::{ChatSession, GuardConfig, OutputEvent};
//!
//! #[tokio::main]
//! async fn main() -> lemonade_guard::Result<()> {
//!     let session = ChatSession::from_config(&GuardConfig::load()?)?;
//!
//!     let mut events = session.submit_turn("How do I make lemonade?");
//!     while let Some(event) = events.next().await {
//!         match event {
//!             OutputEvent::Chunk(text) => print!("{}", text),
//!             other => println!("{:?}", other),
//!         }
//!     }
//!     println!("{}", session.metrics().render_prometheus());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | `ChatSession` orchestration and retry policy |
//! | [`config`] | File and environment configuration |
//! | [`detection`] | Orchestrator verdict interpretation |
//! | [`guardrails`] | Local pattern pre-filter |
//! | [`pipeline`] | SSE decoding and backoff schedule |
//! | [`telemetry`] | Guardrail metrics and log setup |
//! | [`transport`] | Pooled HTTP connection to the orchestrator |
//! | [`types`] | Output events and request types |

pub mod client;
pub mod config;
pub mod detection;
pub mod guardrails;
pub mod pipeline;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CancelHandle, ChatSession, ChatSessionBuilder};
pub use config::{DeploymentMode, GuardConfig, UpstreamConfig};
pub use detection::{DetectionClassifier, DetectorCategory, DetectorKind, Direction};
pub use guardrails::{LocalFilter, PatternSet};
pub use telemetry::{MetricsRegistry, MetricsSnapshot};
pub use transport::{HttpTransport, UpstreamClient};
pub use types::{ChatTurn, OutputEvent, UpstreamRequest};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Events of one chat turn. Failures arrive as `OutputEvent::Error`, never as stream errors.
pub type EventStream = Pin<Box<dyn Stream<Item = OutputEvent> + Send + 'static>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
