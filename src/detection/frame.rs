//! Typed view of one orchestrator frame.
//!
//! Every field is optional on the wire and list entries of the wrong shape are
//! dropped rather than failing the whole frame.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::Direction;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionFrame {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub warnings: Vec<Warning>,
    #[serde(default, deserialize_with = "lenient")]
    pub detections: Detections,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub choices: Vec<Choice>,
}

impl DetectionFrame {
    /// Never fails: anything unreadable becomes an empty frame.
    pub fn from_value(value: &Value) -> Self {
        Self::deserialize(value).unwrap_or_default()
    }

    /// Non-empty `choices[0].delta.content`.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Warning {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Detections {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub input: Vec<DetectionGroup>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub output: Vec<DetectionGroup>,
}

impl Detections {
    pub fn groups(&self, direction: Direction) -> &[DetectionGroup] {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    pub fn results(&self, direction: Direction) -> impl Iterator<Item = &DetectionResult> {
        self.groups(direction).iter().flat_map(|g| g.results.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.output.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionGroup {
    #[serde(default)]
    pub detector_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub results: Vec<DetectionResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetectionResult {
    #[serde(default, deserialize_with = "lenient")]
    pub detector_id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Choice {
    #[serde(default, deserialize_with = "lenient")]
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delta {
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}
