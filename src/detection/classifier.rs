use super::frame::DetectionFrame;
use super::{DetectorCategory, DetectorKind, Direction, CLOSING_INVITATION};
use crate::telemetry::metrics::MetricsRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Minimum score a detector must exceed before its result blocks.
///
/// Without a matching threshold every warning-flagged result is actionable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreThreshold {
    pub detector: String,
    pub direction: Direction,
    pub min_score: f64,
}

/// Detector hits collected during one turn, deduplicated, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectedTypes {
    seen: Vec<(DetectorKind, Direction)>,
}

impl DetectedTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the pair was already recorded.
    pub fn insert(&mut self, kind: DetectorKind, direction: Direction) -> bool {
        if self.seen.contains(&(kind, direction)) {
            return false;
        }
        self.seen.push((kind, direction));
        true
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(DetectorKind, Direction)> {
        self.seen.iter()
    }

    /// Category of the first hit; `Generic` when nothing was recorded.
    pub fn primary_category(&self) -> DetectorCategory {
        self.seen
            .first()
            .map(|(kind, _)| kind.category())
            .unwrap_or(DetectorCategory::Generic)
    }

    /// One reason per hit followed by the closing invitation.
    pub fn refusal_message(&self) -> String {
        let reasons: Vec<&str> = self.seen.iter().map(|(k, d)| k.reason(*d)).collect();
        format!("{}{}", reasons.join(" "), CLOSING_INVITATION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub message: String,
    pub category: DetectorCategory,
}

/// Outcome of classifying one frame. `verdict` wins over `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub content: Option<String>,
    pub verdict: Option<Verdict>,
}

impl Classification {
    pub fn is_blocked(&self) -> bool {
        self.verdict.is_some()
    }
}

/// Interprets orchestrator frames: folds detection results into metrics and
/// decides whether the turn must be aborted.
#[derive(Clone)]
pub struct DetectionClassifier {
    metrics: Arc<MetricsRegistry>,
    thresholds: Vec<ScoreThreshold>,
}

impl DetectionClassifier {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            metrics,
            thresholds: Vec::new(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: Vec<ScoreThreshold>) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn classify(&self, payload: &Value, state: &mut DetectedTypes) -> Classification {
        let frame = DetectionFrame::from_value(payload);
        self.classify_frame(&frame, state)
    }

    /// Metrics are folded on every call, so classifying the same frame twice
    /// counts twice. Dedup of detected types only spans `state`.
    pub fn classify_frame(
        &self,
        frame: &DetectionFrame,
        state: &mut DetectedTypes,
    ) -> Classification {
        if !frame.detections.is_empty() {
            debug!(detections = ?frame.detections, "detections in frame");
        }
        if !frame.warnings.is_empty() {
            debug!(warnings = ?frame.warnings, "warnings in frame");
        }

        for direction in Direction::ALL {
            for result in frame.detections.results(direction) {
                if !result.detector_id.is_empty() {
                    self.metrics.record_detection(&result.detector_id, direction);
                }
            }
        }

        for warning in &frame.warnings {
            let Some(direction) = Direction::from_warning_type(&warning.kind) else {
                continue;
            };
            for result in frame.detections.results(direction) {
                let Some(kind) = DetectorKind::from_id(&result.detector_id) else {
                    continue;
                };
                let score = result.score.unwrap_or(0.0);
                if !self.clears_threshold(kind, direction, score) {
                    debug!(detector = %kind, direction = %direction, score, "below threshold");
                    continue;
                }
                if state.insert(kind, direction) {
                    info!(detector = %kind, direction = %direction, score, "detector flagged turn");
                }
            }
        }

        if !state.is_empty() {
            return Classification {
                content: None,
                verdict: Some(Verdict {
                    message: state.refusal_message(),
                    category: state.primary_category(),
                }),
            };
        }

        Classification {
            content: frame.content().map(str::to_string),
            verdict: None,
        }
    }

    fn clears_threshold(&self, kind: DetectorKind, direction: Direction, score: f64) -> bool {
        self.thresholds
            .iter()
            .filter(|t| t.detector == kind.id() && t.direction == direction)
            .all(|t| score > t.min_score)
    }
}
