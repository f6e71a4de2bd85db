//! Detection verdicts from the orchestrator.
//!
//! The orchestrator runs its detectors on the user message (`input`) and on the
//! generated text (`output`). Each streamed frame may carry results for either
//! direction plus `UNSUITABLE_*` warnings telling which direction fired.
//! [`DetectionClassifier`] turns that into metrics and an abort decision.

pub mod classifier;
pub mod frame;

pub use classifier::{Classification, DetectedTypes, DetectionClassifier, ScoreThreshold, Verdict};
pub use frame::DetectionFrame;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Appended to every refusal.
pub const CLOSING_INVITATION: &str = " Is there anything else I can help you with?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Input, Direction::Output];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }

    /// Map an orchestrator warning type to the direction it flags.
    pub fn from_warning_type(kind: &str) -> Option<Self> {
        match kind {
            "UNSUITABLE_INPUT" => Some(Direction::Input),
            "UNSUITABLE_OUTPUT" => Some(Direction::Output),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detectors this service knows how to explain to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Hap,
    RegexCompetitor,
    PromptInjection,
    LanguageDetection,
}

impl DetectorKind {
    /// Exposition order of the metrics registry.
    pub const ALL: [DetectorKind; 4] = [
        DetectorKind::Hap,
        DetectorKind::RegexCompetitor,
        DetectorKind::PromptInjection,
        DetectorKind::LanguageDetection,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DetectorKind::Hap => "hap",
            DetectorKind::RegexCompetitor => "regex_competitor",
            DetectorKind::PromptInjection => "prompt_injection",
            DetectorKind::LanguageDetection => "language_detection",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }

    pub fn category(&self) -> DetectorCategory {
        match self {
            DetectorKind::Hap => DetectorCategory::Hap,
            DetectorKind::RegexCompetitor => DetectorCategory::Regex,
            DetectorKind::PromptInjection => DetectorCategory::PromptInjection,
            DetectorKind::LanguageDetection => DetectorCategory::Language,
        }
    }

    /// User-facing explanation for a detection in `direction`.
    pub fn reason(&self, direction: Direction) -> &'static str {
        match (self, direction) {
            (DetectorKind::Hap, Direction::Input) => {
                "🤬 Your message was flagged for containing potentially harmful or inappropriate content."
            }
            (DetectorKind::Hap, Direction::Output) => {
                "🤬 The response was blocked for containing potentially harmful or inappropriate content."
            }
            (DetectorKind::PromptInjection, Direction::Input) => {
                "👮 Your message appears to contain instructions that try to override the system rules."
            }
            (DetectorKind::PromptInjection, Direction::Output) => {
                "👮 The response was blocked for containing suspicious instructions."
            }
            (DetectorKind::RegexCompetitor, Direction::Input) => {
                "🍏 I can only discuss lemons! Other fruits and off-topic subjects are not allowed."
            }
            (DetectorKind::RegexCompetitor, Direction::Output) => {
                "🍏 Oops! I almost talked about other fruits. Let's stick to lemons!"
            }
            (DetectorKind::LanguageDetection, Direction::Input) => {
                "🇬🇧 I can only communicate in English. Please rephrase your message in English."
            }
            (DetectorKind::LanguageDetection, Direction::Output) => {
                "🇬🇧 I can only answer in English."
            }
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Coarse label front ends use to style a refusal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorCategory {
    Language,
    PromptInjection,
    Regex,
    Hap,
    /// Fallback when no detector could be attributed.
    Generic,
}

impl DetectorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorCategory::Language => "language",
            DetectorCategory::PromptInjection => "prompt-injection",
            DetectorCategory::Regex => "regex",
            DetectorCategory::Hap => "hap",
            DetectorCategory::Generic => "error",
        }
    }
}

impl fmt::Display for DetectorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full refusal text for a local pattern block.
pub fn local_block_message() -> String {
    format!(
        "{}{}",
        DetectorKind::RegexCompetitor.reason(Direction::Input),
        CLOSING_INVITATION
    )
}
