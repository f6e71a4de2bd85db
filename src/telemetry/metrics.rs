//! Guardrail counters.
//!
//! All counters sit behind one mutex so a snapshot is always a consistent cut:
//! a local block bumps `local_blocks` and `regex_competitor/input` together and a
//! reader never sees one without the other.

use crate::detection::{DetectorKind, Direction};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Series that collects every detector id outside [`DetectorKind`].
pub const OTHER_DETECTOR: &str = "other";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectionCounts {
    pub input: u64,
    pub output: u64,
}

impl DirectionCounts {
    pub fn get(&self, direction: Direction) -> u64 {
        match direction {
            Direction::Input => self.input,
            Direction::Output => self.output,
        }
    }

    fn bump(&mut self, direction: Direction) {
        let slot = match direction {
            Direction::Input => &mut self.input,
            Direction::Output => &mut self.output,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        self.input.saturating_add(self.output)
    }
}

/// Point-in-time copy of the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub local_blocks: u64,
    /// Per detector, known detectors first, then the shared `other` series once used.
    pub detections: Vec<(String, DirectionCounts)>,
}

impl MetricsSnapshot {
    pub fn detection_count(&self, detector_id: &str, direction: Direction) -> u64 {
        self.detections
            .iter()
            .find(|(id, _)| id == detector_id)
            .map(|(_, c)| c.get(direction))
            .unwrap_or(0)
    }

    pub fn by_detector(&self, detector_id: &str) -> u64 {
        self.detections
            .iter()
            .find(|(id, _)| id == detector_id)
            .map(|(_, c)| c.total())
            .unwrap_or(0)
    }

    pub fn by_direction(&self, direction: Direction) -> u64 {
        self.detections.iter().map(|(_, c)| c.get(direction)).sum()
    }

    /// Prometheus text exposition format.
    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        counter_header(
            &mut out,
            "guardrail_requests_total",
            "Total number of requests processed",
        );
        let _ = writeln!(out, "guardrail_requests_total {}", self.total_requests);
        out.push('\n');

        counter_header(
            &mut out,
            "guardrail_local_regex_blocks_total",
            "Requests blocked locally by regex (not sent to orchestrator)",
        );
        let _ = writeln!(out, "guardrail_local_regex_blocks_total {}", self.local_blocks);
        out.push('\n');

        counter_header(
            &mut out,
            "guardrail_detections_total",
            "Total number of guardrail detections",
        );
        for (detector, counts) in &self.detections {
            for direction in Direction::ALL {
                let _ = writeln!(
                    out,
                    "guardrail_detections_total{{detector=\"{}\",direction=\"{}\"}} {}",
                    escape_label(detector),
                    direction,
                    counts.get(direction)
                );
            }
        }
        out.push('\n');

        counter_header(
            &mut out,
            "guardrail_detections_by_detector",
            "Guardrail detections grouped by detector",
        );
        for (detector, counts) in &self.detections {
            let _ = writeln!(
                out,
                "guardrail_detections_by_detector{{detector=\"{}\"}} {}",
                escape_label(detector),
                counts.total()
            );
        }
        out.push('\n');

        counter_header(
            &mut out,
            "guardrail_detections_by_direction",
            "Guardrail detections grouped by direction",
        );
        for direction in Direction::ALL {
            let _ = writeln!(
                out,
                "guardrail_detections_by_direction{{direction=\"{}\"}} {}",
                direction,
                self.by_direction(direction)
            );
        }
        out
    }
}

fn counter_header(out: &mut String, name: &str, help: &str) {
    let _ = writeln!(out, "# HELP {} {}", name, help);
    let _ = writeln!(out, "# TYPE {} counter", name);
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Shared counters for every turn of a session.
#[derive(Debug)]
pub struct MetricsRegistry {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let detections = DetectorKind::ALL
            .iter()
            .map(|k| (k.id().to_string(), DirectionCounts::default()))
            .collect();
        Self {
            inner: Mutex::new(MetricsSnapshot {
                total_requests: 0,
                local_blocks: 0,
                detections,
            }),
        }
    }

    // Counters are plain integers; a panic elsewhere cannot leave them torn.
    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn increment_request(&self) {
        let mut m = self.lock();
        m.total_requests = m.total_requests.saturating_add(1);
    }

    /// A local block is also an input-side `regex_competitor` detection.
    pub fn increment_local_block(&self) {
        let mut m = self.lock();
        m.local_blocks = m.local_blocks.saturating_add(1);
        bump_detection(&mut m, DetectorKind::RegexCompetitor.id(), Direction::Input);
    }

    pub fn record_detection(&self, detector_id: &str, direction: Direction) {
        let mut m = self.lock();
        bump_detection(&mut m, detector_id, direction);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    pub fn render_prometheus(&self) -> String {
        self.snapshot().render_prometheus()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Unrecognized ids share one series so upstream data cannot grow the registry.
fn bump_detection(m: &mut MetricsSnapshot, detector_id: &str, direction: Direction) {
    let detector_id = DetectorKind::from_id(detector_id)
        .map(|k| k.id())
        .unwrap_or(OTHER_DETECTOR);
    match m.detections.iter_mut().find(|(id, _)| id == detector_id) {
        Some((_, counts)) => counts.bump(direction),
        None => {
            let mut counts = DirectionCounts::default();
            counts.bump(direction);
            m.detections.push((detector_id.to_string(), counts));
        }
    }
}
