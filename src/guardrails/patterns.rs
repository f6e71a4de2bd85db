//! Compiled pattern rules.

use super::builtin;
use crate::{Error, ErrorContext, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder, RegexSet, RegexSetBuilder};
use std::sync::Arc;

// The multi-language alternations are large once Unicode case folding is applied.
const SIZE_LIMIT: usize = 64 << 20;

static BUILTIN: Lazy<std::result::Result<Arc<PatternSet>, String>> = Lazy::new(|| {
    PatternSet::new(builtin::all())
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

/// Which rule matched, and on what text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    pub index: usize,
    pub pattern: String,
    pub matched: String,
}

/// Immutable, precompiled pattern rules.
///
/// Matching is case-insensitive with Unicode-aware word boundaries. The
/// [`RegexSet`] answers "does anything match" in one pass; the individual
/// regexes are only consulted to explain a match.
#[derive(Debug, Clone)]
pub struct PatternSet {
    set: RegexSet,
    regexes: Vec<Regex>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sources: Vec<String> = patterns.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut regexes = Vec::with_capacity(sources.len());
        for (i, src) in sources.iter().enumerate() {
            let re = RegexBuilder::new(src)
                .case_insensitive(true)
                .size_limit(SIZE_LIMIT)
                .build()
                .map_err(|e| {
                    Error::configuration_with_context(
                        "invalid pattern",
                        ErrorContext::new()
                            .with_field_path(format!("patterns[{}]", i))
                            .with_details(e.to_string())
                            .with_source("pattern_compiler"),
                    )
                })?;
            regexes.push(re);
        }

        let set = RegexSetBuilder::new(&sources)
            .case_insensitive(true)
            .size_limit(SIZE_LIMIT)
            .build()
            .map_err(|e| {
                Error::configuration_with_context(
                    "pattern set does not compile",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("pattern_compiler"),
                )
            })?;

        Ok(Self { set, regexes })
    }

    /// The patterns shipped with the crate, compiled once per process.
    pub fn builtin() -> Result<Arc<PatternSet>> {
        BUILTIN
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| Error::configuration(format!("builtin patterns: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.regexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regexes.is_empty()
    }

    /// Pattern sources in rule order; these are also sent upstream for the
    /// output-side pattern detector.
    pub fn sources(&self) -> &[String] {
        self.set.patterns()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.set.is_match(text)
    }

    /// Lowest-index matching rule.
    pub fn first_match(&self, text: &str) -> Option<PatternMatch> {
        let index = self.set.matches(text).into_iter().next()?;
        let m = self.regexes[index].find(text)?;
        Some(PatternMatch {
            index,
            pattern: self.set.patterns()[index].clone(),
            matched: m.as_str().to_string(),
        })
    }
}
