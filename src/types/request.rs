//! Request types for the detection orchestrator.

use crate::detection::DetectorKind;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One inbound user message. Each turn is stateless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub message: String,
}

impl ChatTurn {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.message.chars().count()
    }
}

/// Detector selection per direction, keyed by detector id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorsConfig {
    #[serde(default)]
    pub input: BTreeMap<String, Value>,
    #[serde(default)]
    pub output: BTreeMap<String, Value>,
}

impl DetectorsConfig {
    /// The usual lineup: hap, language and injection on input; hap, language and
    /// the pattern detector on output. The pattern detector also runs on input
    /// unless the caller already checked locally (see [`without_input`](Self::without_input)).
    pub fn standard(patterns: &[String]) -> Self {
        let regex = json!({ "regex": patterns });

        let mut input = BTreeMap::new();
        input.insert(DetectorKind::Hap.id().to_string(), json!({}));
        input.insert(DetectorKind::LanguageDetection.id().to_string(), json!({}));
        input.insert(DetectorKind::PromptInjection.id().to_string(), json!({}));
        input.insert(DetectorKind::RegexCompetitor.id().to_string(), regex.clone());

        let mut output = BTreeMap::new();
        output.insert(DetectorKind::Hap.id().to_string(), json!({}));
        output.insert(DetectorKind::RegexCompetitor.id().to_string(), regex);
        output.insert(DetectorKind::LanguageDetection.id().to_string(), json!({}));

        Self { input, output }
    }

    pub fn without_input(mut self, kind: DetectorKind) -> Self {
        self.input.remove(kind.id());
        self
    }
}

/// Chat-completion request with detector configuration, built fresh per turn.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub model: String,
    pub system_prompt: String,
    pub user_message: String,
    pub stream: bool,
    pub max_tokens: u32,
    pub detectors: DetectorsConfig,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

// OpenAI-style body: the prompt pair travels as a `messages` array.
impl Serialize for UpstreamRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let messages = [
            WireMessage {
                role: "system",
                content: &self.system_prompt,
            },
            WireMessage {
                role: "user",
                content: &self.user_message,
            },
        ];
        let mut s = serializer.serialize_struct("UpstreamRequest", 5)?;
        s.serialize_field("model", &self.model)?;
        s.serialize_field("messages", &messages)?;
        s.serialize_field("stream", &self.stream)?;
        s.serialize_field("max_tokens", &self.max_tokens)?;
        s.serialize_field("detectors", &self.detectors)?;
        s.end()
    }
}
