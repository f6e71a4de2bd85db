use crate::client::policy::PolicyEngine;
use crate::client::session::{ChatSession, SessionInner};
use crate::config::GuardConfig;
use crate::detection::DetectionClassifier;
use crate::guardrails::LocalFilter;
use crate::pipeline::SseDecoder;
use crate::telemetry::metrics::MetricsRegistry;
use crate::transport::{HttpTransport, UpstreamClient};
use crate::Result;
use std::sync::Arc;
use tracing::info;

/// Builder for [`ChatSession`].
///
/// Everything not set explicitly is derived from the [`GuardConfig`]: the HTTP
/// transport, the local patterns (builtin unless the config lists its own), and
/// a fresh metrics registry.
pub struct ChatSessionBuilder {
    config: GuardConfig,
    upstream: Option<Arc<dyn UpstreamClient>>,
    filter: Option<LocalFilter>,
    metrics: Option<Arc<MetricsRegistry>>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl ChatSessionBuilder {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            upstream: None,
            filter: None,
            metrics: None,
            base_url_override: None,
        }
    }

    /// Use a custom upstream instead of the HTTP transport.
    pub fn upstream(mut self, upstream: Arc<dyn UpstreamClient>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    pub fn filter(mut self, filter: LocalFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Share a registry between sessions.
    pub fn metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Point the HTTP transport at `base_url` (scheme, host and port) instead of
    /// the address derived from the deployment mode.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    pub fn build(self) -> Result<ChatSession> {
        let mut config = self.config;
        if let Some(base) = self.base_url_override {
            config.upstream.base_url = Some(base);
        }
        config.validate()?;

        let filter = match (self.filter, &config.patterns) {
            (Some(filter), _) => filter,
            (None, Some(patterns)) => LocalFilter::from_patterns(patterns)?,
            (None, None) => LocalFilter::builtin()?,
        };

        let upstream: Arc<dyn UpstreamClient> = match self.upstream {
            Some(upstream) => upstream,
            None => {
                let transport = HttpTransport::new(&config.upstream)?;
                info!(
                    endpoint = %transport.endpoint(),
                    model = %config.model,
                    "orchestrator transport ready"
                );
                Arc::new(transport)
            }
        };

        let metrics = self.metrics.unwrap_or_default();
        let classifier = DetectionClassifier::new(Arc::clone(&metrics))
            .with_thresholds(config.thresholds.clone());

        Ok(ChatSession::from_inner(SessionInner {
            upstream,
            filter,
            classifier,
            metrics,
            decoder: SseDecoder::default(),
            policy: PolicyEngine::new(config.retry.clone()),
            system_prompt: config.resolve_system_prompt()?,
            model: config.model,
            max_tokens: config.max_tokens,
            max_input_chars: config.max_input_chars,
            turn_timeout: config.upstream.timeouts.turn(),
        }))
    }
}
