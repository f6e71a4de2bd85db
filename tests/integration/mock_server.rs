//! Mock orchestrators for integration tests

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use lemonade_guard::error::TimeoutStage;
use lemonade_guard::transport::TransportError;
use lemonade_guard::{
    BoxStream, ChatSession, ChatSessionBuilder, Error, GuardConfig, OutputEvent, UpstreamClient,
    UpstreamRequest,
};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PATH: &str = "/api/v2/chat/completions-detection";

/// Config with an inline prompt and short backoff so tests stay fast.
pub fn test_config() -> GuardConfig {
    let mut config = GuardConfig::default();
    config.system_prompt = Some("You only talk about lemons.".to_string());
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

pub fn content_frame(text: &str) -> String {
    serde_json::json!({"choices": [{"delta": {"content": text}}]}).to_string()
}

pub fn hap_output_frame(score: f64) -> String {
    serde_json::json!({
        "warnings": [{"type": "UNSUITABLE_OUTPUT", "message": "Unsuitable output detected."}],
        "detections": {
            "output": [{"detector_id": "hap", "results": [{"detector_id": "hap", "score": score}]}]
        },
        "choices": [{"delta": {"content": "something nasty"}}]
    })
    .to_string()
}

/// Render payloads as an SSE body terminated by `[DONE]`.
pub fn sse_body(frames: &[String]) -> String {
    let mut body: String = frames.iter().map(|f| format!("data: {}\n\n", f)).collect();
    body.push_str("data: [DONE]\n\n");
    body
}

pub async fn collect(session: &ChatSession, message: &str) -> Vec<OutputEvent> {
    session.submit_turn(message).collect().await
}

/// Test fixture that manages a mockito orchestrator
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Session over the real HTTP transport, pointed at the mock server.
    pub fn session(&self, config: GuardConfig) -> ChatSession {
        ChatSessionBuilder::new(config)
            .base_url_override(&self.base_url)
            .build()
            .expect("session builds")
    }

    /// Successful SSE response served `hits` times.
    pub async fn mock_sse_stream(&mut self, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", PATH)
            .match_header("accept", "text/event-stream")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "stream": true,
                "max_tokens": 200
            })))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    pub async fn mock_error_response(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}

/// One scripted upstream attempt.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 2xx response whose body arrives in exactly these pieces.
    Body(Vec<Vec<u8>>),
    /// Body pieces, then an inter-chunk read timeout.
    BodyThenTimeout(Vec<Vec<u8>>),
    /// Body pieces, then silence until the caller gives up.
    BodyThenHang(Vec<Vec<u8>>),
    ConnectionReset,
    Status(u16),
}

impl Scripted {
    pub fn frames(frames: &[String]) -> Self {
        Scripted::Body(vec![sse_body(frames).into_bytes()])
    }

    pub fn empty() -> Self {
        Scripted::Body(Vec::new())
    }
}

/// In-process upstream replaying a script; the last entry repeats forever.
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedUpstream {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn session(self: &Arc<Self>, config: GuardConfig) -> ChatSession {
        ChatSessionBuilder::new(config)
            .upstream(self.clone())
            .build()
            .expect("session builds")
    }

    fn next_script(&self) -> Scripted {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap_or_else(Scripted::empty)
        }
    }
}

fn pieces(body: Vec<Vec<u8>>) -> impl futures::Stream<Item = lemonade_guard::Result<Bytes>> {
    stream::iter(body.into_iter().map(|p| Ok(Bytes::from(p))))
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn send(
        &self,
        request: &UpstreamRequest,
    ) -> lemonade_guard::Result<BoxStream<'static, Bytes>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        match self.next_script() {
            Scripted::Body(body) => Ok(Box::pin(pieces(body))),
            Scripted::BodyThenTimeout(body) => Ok(Box::pin(pieces(body).chain(stream::once(async {
                Err(Error::Timeout {
                    stage: TimeoutStage::Idle,
                })
            })))),
            Scripted::BodyThenHang(body) => Ok(Box::pin(pieces(body).chain(stream::pending()))),
            Scripted::ConnectionReset => Err(Error::Transport(TransportError::Other(
                "connection reset by peer".into(),
            ))),
            Scripted::Status(status) => Err(Error::Remote {
                status,
                message: "upstream failure".into(),
            }),
        }
    }
}
