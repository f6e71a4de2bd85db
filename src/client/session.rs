use crate::client::policy::{Decision, PolicyEngine};
use crate::client::CancelHandle;
use crate::detection::{
    local_block_message, DetectedTypes, DetectionClassifier, DetectorCategory, DetectorKind,
};
use crate::error::TimeoutStage;
use crate::guardrails::LocalFilter;
use crate::pipeline::{SseDecoder, SseFrame};
use crate::telemetry::metrics::MetricsRegistry;
use crate::transport::UpstreamClient;
use crate::types::{ChatTurn, DetectorsConfig, OutputEvent, UpstreamRequest};
use crate::{BoxStream, Error, EventStream};
use futures::{stream, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

pub(crate) struct SessionInner {
    pub(crate) upstream: Arc<dyn UpstreamClient>,
    pub(crate) filter: LocalFilter,
    pub(crate) classifier: DetectionClassifier,
    pub(crate) metrics: Arc<MetricsRegistry>,
    pub(crate) decoder: SseDecoder,
    pub(crate) policy: PolicyEngine,
    pub(crate) model: String,
    pub(crate) system_prompt: String,
    pub(crate) max_tokens: u32,
    pub(crate) max_input_chars: usize,
    pub(crate) turn_timeout: Duration,
}

/// Guarded chat front door.
///
/// Each call to [`submit_turn`](Self::submit_turn) runs one stateless turn:
/// length check, local pattern check, upstream dispatch with retries, then
/// detection-aware streaming. Cheap to clone; clones share the connection pool,
/// the compiled patterns and the metrics.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<SessionInner>,
}

impl ChatSession {
    pub(crate) fn from_inner(inner: SessionInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Session over the HTTP transport, configured from `config`.
    pub fn from_config(config: &crate::GuardConfig) -> crate::Result<Self> {
        crate::client::ChatSessionBuilder::new(config.clone()).build()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.inner.metrics
    }

    pub fn filter(&self) -> &LocalFilter {
        &self.inner.filter
    }

    /// Run one turn. Nothing happens until the returned stream is polled.
    ///
    /// The stream yields zero or more `Chunk`s and then exactly one terminal
    /// event. Dropping it mid-turn releases the upstream connection and any
    /// pending backoff timer.
    pub fn submit_turn(&self, message: impl Into<String>) -> EventStream {
        let span = info_span!("turn", turn_id = %uuid::Uuid::new_v4());
        let turn = Turn {
            inner: Arc::clone(&self.inner),
            turn: ChatTurn::new(message),
            phase: Phase::Init,
            deadline: None,
        };

        let events = stream::unfold((turn, span), |(mut turn, span)| async move {
            let event = turn.next_event().instrument(span.clone()).await?;
            Some((event, (turn, span)))
        });
        Box::pin(events)
    }

    /// Like [`submit_turn`](Self::submit_turn), plus a handle that ends the turn
    /// early from another task. A cancelled turn emits no terminal event.
    ///
    /// The first poll after cancellation drops the turn, and with it the upstream
    /// response and its pool slots, even if the caller keeps the stream around.
    pub fn submit_turn_with_cancel(
        &self,
        message: impl Into<String>,
    ) -> (EventStream, CancelHandle) {
        let handle = CancelHandle::new();
        let token = handle.token();
        let turn = self.submit_turn(message);

        let events = stream::unfold(turn, move |mut turn| {
            let token = token.clone();
            async move {
                let event = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("turn cancelled");
                        None
                    }
                    event = turn.next() => event,
                };
                event.map(|event| (event, turn))
            }
        });
        (Box::pin(events.fuse()), handle)
    }
}

enum Phase {
    Init,
    Dispatch {
        attempt: u32,
        delay: Duration,
    },
    Streaming {
        frames: BoxStream<'static, SseFrame>,
        attempt: u32,
        emitted: bool,
        detected: DetectedTypes,
    },
    Finished,
}

struct Turn {
    inner: Arc<SessionInner>,
    turn: ChatTurn,
    phase: Phase,
    deadline: Option<Instant>,
}

impl Turn {
    async fn next_event(&mut self) -> Option<OutputEvent> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Finished) {
                Phase::Finished => return None,
                Phase::Init => {
                    if let Some(event) = self.admit() {
                        return Some(event);
                    }
                    self.deadline = Some(Instant::now() + self.inner.turn_timeout);
                    self.phase = Phase::Dispatch {
                        attempt: 0,
                        delay: Duration::ZERO,
                    };
                }
                Phase::Dispatch { attempt, delay } => {
                    if let Some(event) = self.dispatch(attempt, delay).await {
                        return Some(event);
                    }
                }
                Phase::Streaming {
                    mut frames,
                    attempt,
                    mut emitted,
                    mut detected,
                } => {
                    let next = match tokio::time::timeout_at(self.deadline(), frames.next()).await {
                        Ok(next) => next,
                        Err(_) => {
                            return Some(fail(Error::Timeout {
                                stage: TimeoutStage::Turn,
                            }))
                        }
                    };

                    match next {
                        None if emitted => {
                            info!(attempt, "turn completed");
                            return Some(OutputEvent::Done);
                        }
                        None => {
                            if let Some(event) = self.retry_or_fail(Error::EmptyStream, attempt) {
                                return Some(event);
                            }
                        }
                        Some(Err(e)) if emitted => {
                            // Output already reached the caller; a retry would repeat it.
                            return Some(fail(e));
                        }
                        Some(Err(e)) => {
                            if let Some(event) = self.retry_or_fail(e, attempt) {
                                return Some(event);
                            }
                        }
                        Some(Ok(SseFrame::Error(payload))) => {
                            return Some(self.upstream_error(&payload));
                        }
                        Some(Ok(SseFrame::Data(payload))) => {
                            let c = self.inner.classifier.classify(&payload, &mut detected);
                            if let Some(verdict) = c.verdict {
                                info!(category = %verdict.category, "turn blocked by detection");
                                return Some(OutputEvent::Blocked {
                                    message: verdict.message,
                                    category: verdict.category,
                                });
                            }
                            let chunk = c.content.map(|text| {
                                emitted = true;
                                OutputEvent::Chunk(format!("{}\n", text))
                            });
                            self.phase = Phase::Streaming {
                                frames,
                                attempt,
                                emitted,
                                detected,
                            };
                            if chunk.is_some() {
                                return chunk;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Length and local-pattern gates. `Some` ends the turn before any I/O.
    fn admit(&self) -> Option<OutputEvent> {
        let inner = &self.inner;
        inner.metrics.increment_request();

        let length = self.turn.char_len();
        if length > inner.max_input_chars {
            let err = Error::InputTooLong {
                length,
                max: inner.max_input_chars,
            };
            info!(error = %err, "message rejected");
            return Some(OutputEvent::Error(err.user_message()));
        }

        if let Some(m) = inner.filter.first_match(&self.turn.message) {
            debug!(
                pattern_index = m.index,
                matched = %m.matched,
                pattern = %m.pattern.chars().take(100).collect::<String>(),
                "local pattern matched"
            );
            inner.metrics.increment_local_block();
            return Some(OutputEvent::Blocked {
                message: local_block_message(),
                category: DetectorCategory::Regex,
            });
        }
        debug!("local pattern check passed");
        None
    }

    async fn dispatch(&mut self, attempt: u32, delay: Duration) -> Option<OutputEvent> {
        let deadline = self.deadline();
        if !delay.is_zero()
            && tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                .await
                .is_err()
        {
            return Some(fail(Error::Timeout {
                stage: TimeoutStage::Turn,
            }));
        }

        let request = self.build_request();
        debug!(
            attempt = attempt + 1,
            max_attempts = self.inner.policy.max_retries() + 1,
            "sending request upstream"
        );
        match tokio::time::timeout_at(deadline, self.inner.upstream.send(&request)).await {
            Err(_) => Some(fail(Error::Timeout {
                stage: TimeoutStage::Turn,
            })),
            Ok(Err(e)) => self.retry_or_fail(e, attempt),
            Ok(Ok(bytes)) => {
                self.phase = Phase::Streaming {
                    frames: self.inner.decoder.decode_stream(bytes),
                    attempt,
                    emitted: false,
                    detected: DetectedTypes::new(),
                };
                None
            }
        }
    }

    fn build_request(&self) -> UpstreamRequest {
        let inner = &self.inner;
        // The input already cleared the local patterns; only the output side needs them.
        let detectors = DetectorsConfig::standard(inner.filter.patterns().sources())
            .without_input(DetectorKind::RegexCompetitor);
        UpstreamRequest {
            model: inner.model.clone(),
            system_prompt: inner.system_prompt.clone(),
            user_message: self.turn.message.clone(),
            stream: true,
            max_tokens: inner.max_tokens,
            detectors,
        }
    }

    /// Schedule another attempt (returns `None`) or end the turn.
    fn retry_or_fail(&mut self, err: Error, attempt: u32) -> Option<OutputEvent> {
        match self.inner.policy.decide(&err, attempt) {
            Decision::Retry { delay } => {
                info!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying upstream request"
                );
                self.phase = Phase::Dispatch {
                    attempt: attempt + 1,
                    delay,
                };
                None
            }
            Decision::Fail => Some(fail(err)),
        }
    }

    fn upstream_error(&self, payload: &Value) -> OutputEvent {
        let details = payload
            .get("details")
            .or_else(|| payload.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if details.contains("max_tokens") || details.contains("too large") {
            info!(details = %details, "upstream rejected input size");
            let err = Error::InputTooLong {
                length: self.turn.char_len(),
                max: self.inner.max_input_chars,
            };
            return OutputEvent::Error(err.user_message());
        }
        fail(Error::UpstreamEvent { details })
    }

    fn deadline(&self) -> Instant {
        self.deadline
            .unwrap_or_else(|| Instant::now() + self.inner.turn_timeout)
    }
}

fn fail(err: Error) -> OutputEvent {
    warn!(error = %err, "turn failed");
    OutputEvent::Error(err.user_message())
}
