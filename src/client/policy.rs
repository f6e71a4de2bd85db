use crate::pipeline::{RetryConfig, RetryOperator};
use crate::Error;
use std::time::Duration;

/// Internal decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Internal policy engine for upstream retries.
///
/// Important constraints:
/// - Only failures seen before any chunk reached the caller get here.
/// - Prefer deterministic, explainable behavior over clever heuristics.
#[derive(Debug, Clone)]
pub(crate) struct PolicyEngine {
    retry: RetryOperator,
}

impl PolicyEngine {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            retry: RetryOperator::new(config),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.retry.config().max_retries
    }

    /// Decide what to do next after an attempt failed.
    ///
    /// - `attempt` is 0-based (first failure => attempt=0).
    /// - non-2xx responses are never retried.
    pub fn decide(&self, err: &Error, attempt: u32) -> Decision {
        if !err.is_retryable() || self.retry.exhausted(attempt) {
            return Decision::Fail;
        }

        let delay = match err {
            Error::EmptyStream => self.retry.empty_stream_backoff(attempt),
            _ => self.retry.backoff(attempt),
        };
        Decision::Retry { delay }
    }
}
