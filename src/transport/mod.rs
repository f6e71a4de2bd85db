//! Upstream transport: the pooled connection to the detection orchestrator.

mod http;

pub use http::{HttpTransport, TransportError};

use crate::types::request::UpstreamRequest;
use crate::{BoxStream, Result};
use bytes::Bytes;

/// The seam between a turn and the moderation/completion service.
///
/// `send` resolves once response headers arrived with a 2xx status; the body is
/// returned as raw bytes. Dropping the stream releases the connection.
#[async_trait::async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: &UpstreamRequest) -> Result<BoxStream<'static, Bytes>>;
}
