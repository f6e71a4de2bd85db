//! Observability: guardrail counters and log setup.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`MetricsRegistry`] | Request, local-block and per-detector counters |
//! | [`MetricsSnapshot`] | Consistent copy of the counters, renders Prometheus text |
//! | [`init_tracing`] | Installs a `tracing` subscriber for binaries |

pub mod metrics;

pub use metrics::{DirectionCounts, MetricsRegistry, MetricsSnapshot};

use tracing_subscriber::EnvFilter;

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. A second call is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
