use crate::pipeline::PipelineError;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;

/// Structured error context for configuration and setup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "upstream.port", "patterns[3]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "pattern_compiler")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Which of the three timeout budgets was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Establishing the upstream connection.
    Connect,
    /// Silence between two body chunks.
    Idle,
    /// Wall-clock ceiling for the whole turn.
    Turn,
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeoutStage::Connect => "connect",
            TimeoutStage::Idle => "inter-chunk read",
            TimeoutStage::Turn => "turn",
        };
        f.write_str(s)
    }
}

/// Unified error type for the guard runtime.
///
/// Policy blocks are not errors: they surface as `OutputEvent::Blocked`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input too long: {length} characters (max {max})")]
    InputTooLong { length: usize, max: usize },

    #[error("Upstream unavailable: {0}")]
    Transport(#[from] TransportError),

    #[error("Upstream timed out during {stage}")]
    Timeout { stage: TimeoutStage },

    #[error("Upstream returned HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Upstream stream ended without content or verdict")]
    EmptyStream,

    #[error("Upstream reported an error event: {details}")]
    UpstreamEvent { details: String },

    #[error("Pipeline processing error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Transport-level failures that a fresh connection may fix.
    ///
    /// A turn-level timeout is not retryable: the budget is already spent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::EmptyStream => true,
            Error::Timeout { stage } => *stage != TimeoutStage::Turn,
            _ => false,
        }
    }

    /// Caller-facing text for this failure.
    ///
    /// Never includes upstream bodies or transport internals; the HTTP status is the
    /// only detail that leaks through.
    pub fn user_message(&self) -> String {
        match self {
            Error::InputTooLong { max, .. } => input_too_long_message(*max),
            Error::Transport(_) => {
                "Sorry, the assistant could not be reached. Please try again.".to_string()
            }
            Error::Timeout { .. } => "Request timed out. Please try again.".to_string(),
            Error::Remote { status, .. } => format!("API error: {}", status),
            Error::EmptyStream => "No response received. Please try again.".to_string(),
            _ => "Sorry, something went wrong. Please try again.".to_string(),
        }
    }
}

fn input_too_long_message(max: usize) -> String {
    format!(
        "Your message is too long! Please keep your question short and simple - ideally under {} characters.",
        max
    )
}
