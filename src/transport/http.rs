use crate::config::UpstreamConfig;
use crate::error::TimeoutStage;
use crate::transport::UpstreamClient;
use crate::types::request::UpstreamRequest;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};
use url::Url;

/// HTTP transport to the orchestrator's chat-completions-detection endpoint.
///
/// Connections come from reqwest's keep-alive pool. Two semaphores bound how many
/// responses may be open at once, overall and towards the orchestrator host. Both
/// permits travel with the body stream so they are returned on every exit path,
/// cancellation included.
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    api_key: Option<String>,
    slots: Arc<Semaphore>,
    host_slots: Arc<Semaphore>,
    read_timeout: Duration,
}

/// Permits held for as long as one response body is open.
struct Checkout {
    _slot: OwnedSemaphorePermit,
    _host_slot: OwnedSemaphorePermit,
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let url = config.endpoint_url()?;
        let pool = &config.pool;

        let client = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect())
            .pool_max_idle_per_host(pool.max_connections_per_host)
            .pool_idle_timeout(Some(config.keepalive()))
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        debug!(
            endpoint = %url,
            mode = ?config.mode(),
            max_connections = pool.max_connections,
            max_connections_per_host = pool.max_connections_per_host,
            keepalive_secs = config.keepalive().as_secs(),
            verify_tls = config.verify_tls(),
            "upstream transport configured"
        );

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            slots: Arc::new(Semaphore::new(pool.max_connections.max(1))),
            host_slots: Arc::new(Semaphore::new(pool.max_connections_per_host.max(1))),
            read_timeout: config.timeouts.read(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// Responses that could be opened right now without waiting.
    ///
    /// All requests go to one host, so this is the smaller of the global and the
    /// per-host free slots.
    pub fn available_slots(&self) -> usize {
        self.slots
            .available_permits()
            .min(self.host_slots.available_permits())
    }

    pub async fn execute_stream(
        &self,
        request: &UpstreamRequest,
    ) -> Result<BoxStream<'static, Bytes>> {
        let permit = self.checkout().await?;

        let mut req = self
            .client
            .post(self.url.clone())
            .json(request)
            .header("accept", "text/event-stream");
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(classify_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                http_status = status.as_u16(),
                body = %body.chars().take(500).collect::<String>(),
                "upstream rejected request"
            );
            return Err(Error::Remote {
                status: status.as_u16(),
                message: body,
            });
        }

        // Per-chunk silence bound; the turn ceiling is enforced by the caller.
        let read_timeout = self.read_timeout;
        let body = Box::pin(resp.bytes_stream());
        let stream = stream::unfold(
            Some((body, permit)),
            move |state| async move {
                let (mut body, permit) = state?;
                match tokio::time::timeout(read_timeout, body.next()).await {
                    Ok(Some(Ok(bytes))) => Some((Ok(bytes), Some((body, permit)))),
                    Ok(Some(Err(e))) => Some((Err(classify_reqwest_error(e)), None)),
                    Ok(None) => None,
                    Err(_) => Some((
                        Err(Error::Timeout {
                            stage: TimeoutStage::Idle,
                        }),
                        None,
                    )),
                }
            },
        );

        Ok(Box::pin(stream))
    }

    // Global slot first, then the host slot; every caller takes them in this order.
    async fn checkout(&self) -> Result<Checkout> {
        let closed =
            |_: AcquireError| Error::Transport(TransportError::Other("connection pool closed".into()));
        let slot = self.slots.clone().acquire_owned().await.map_err(closed)?;
        let host_slot = self.host_slots.clone().acquire_owned().await.map_err(closed)?;
        Ok(Checkout {
            _slot: slot,
            _host_slot: host_slot,
        })
    }
}

#[async_trait::async_trait]
impl UpstreamClient for HttpTransport {
    async fn send(&self, request: &UpstreamRequest) -> Result<BoxStream<'static, Bytes>> {
        self.execute_stream(request).await
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        let stage = if e.is_connect() {
            TimeoutStage::Connect
        } else {
            TimeoutStage::Idle
        };
        return Error::Timeout { stage };
    }
    Error::Transport(TransportError::Http(e))
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
