//! Retry Operator
//!
//! Backoff schedule for upstream attempts. A stream that already delivered content to
//! the caller cannot be replayed, so retries wrap request execution (see
//! `client::policy`), not the data stream itself.

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Configuration for retry logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone)]
pub struct RetryOperator {
    config: RetryConfig,
}

impl RetryOperator {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Exponential backoff: base * 2^attempt, capped at `max_delay`.
    ///
    /// `attempt` is 0-based (delay before the first retry => attempt=0).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay_ms;
        let cap = self.config.max_delay_ms;

        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = base.saturating_mul(factor).min(cap);
        Duration::from_millis(delay)
    }

    /// Backoff after an empty stream.
    ///
    /// An empty stream points at a dead pooled connection, so the first retry goes out
    /// immediately on a fresh one; later retries fall back to the normal schedule
    /// shifted by one.
    pub fn empty_stream_backoff(&self, attempt: u32) -> Duration {
        match attempt {
            0 => Duration::ZERO,
            n => self.backoff(n - 1),
        }
    }

    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.config.max_retries
    }
}
