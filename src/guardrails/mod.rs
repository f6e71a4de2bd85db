//! Local pre-filtering of user messages.
//!
//! Obvious violations (other fruits, rule talk, injection phrasings) are caught
//! here before anything is sent to the orchestrator. The orchestrator still runs
//! the same patterns on the generated output.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PatternSet`] | Immutable compiled rules |
//! | [`LocalFilter`] | Synchronous check of a message against a shared `PatternSet` |
//! | [`builtin`] | Pattern data shipped with the crate |
//!
//! ```rust
//! use lemonade_guard::guardrails::LocalFilter;
//!
//! let filter = LocalFilter::builtin()?;
//! assert!(filter.check("Tell me about apples"));
//! assert!(!filter.check("Tell me about lemons"));
//! # Ok::<(), lemonade_guard::Error>(())
//! ```

pub mod builtin;
mod patterns;

pub use patterns::{PatternMatch, PatternSet};

use crate::Result;
use std::sync::Arc;

/// Pure, deterministic message check. Cheap to clone and share across turns.
#[derive(Debug, Clone)]
pub struct LocalFilter {
    patterns: Arc<PatternSet>,
}

impl LocalFilter {
    pub fn new(patterns: Arc<PatternSet>) -> Self {
        Self { patterns }
    }

    pub fn builtin() -> Result<Self> {
        Ok(Self::new(PatternSet::builtin()?))
    }

    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(Arc::new(PatternSet::new(patterns)?)))
    }

    /// True if any rule matches, i.e. the message must not go upstream.
    pub fn check(&self, message: &str) -> bool {
        self.patterns.is_match(message)
    }

    pub fn first_match(&self, message: &str) -> Option<PatternMatch> {
        self.patterns.first_match(message)
    }

    pub fn patterns(&self) -> &Arc<PatternSet> {
        &self.patterns
    }
}
