//! guard-chat: run one guarded chat turn from the command line.
//!
//! Usage:
//!   guard-chat [--config <file>] [--metrics] <message>
//!
//! Events are printed in their SSE transport form, one record per event.

use anyhow::{bail, Context};
use futures::StreamExt;
use lemonade_guard::telemetry::init_tracing;
use lemonade_guard::{ChatSession, GuardConfig};
use std::path::PathBuf;

struct Args {
    config: Option<PathBuf>,
    metrics: bool,
    message: String,
}

fn print_usage() {
    println!(
        r#"guard-chat: send one message through the guardrails orchestrator

USAGE:
    guard-chat [--config <file>] [--metrics] <message>

OPTIONS:
    --config <file>     YAML configuration (default: $GUARD_CONFIG, else built-in defaults)
    --metrics           Print the Prometheus metrics exposition after the turn
    -h, --help          Show this help message

ENVIRONMENT:
    GUARDRAILS_ORCHESTRATOR_SERVICE_SERVICE_HOST / _PORT, VLLM_MODEL, VLLM_API_KEY,
    GUARD_DEPLOYMENT_MODE, GUARD_TLS_INSECURE, GUARD_MAX_INPUT_CHARS, RUST_LOG"#
    );
}

fn parse_args(args: &[String]) -> anyhow::Result<Option<Args>> {
    let mut config = None;
    let mut metrics = false;
    let mut words = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--metrics" => metrics = true,
            "--config" => {
                let path = iter.next().context("--config needs a file path")?;
                config = Some(PathBuf::from(path));
            }
            other if other.starts_with("--") => bail!("unknown option: {}", other),
            other => words.push(other.to_string()),
        }
    }

    if words.is_empty() {
        bail!("missing message");
    }
    Ok(Some(Args {
        config,
        metrics,
        message: words.join(" "),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("lemonade_guard=info");

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    let config = match &args.config {
        Some(path) => {
            let mut cfg = GuardConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            cfg.apply_env(|k| std::env::var(k).ok())?;
            cfg.validate()?;
            cfg
        }
        None => GuardConfig::load().context("loading configuration")?,
    };

    let session = ChatSession::from_config(&config).context("building chat session")?;
    let mut events = session.submit_turn(args.message);
    while let Some(event) = events.next().await {
        print!("{}", event.to_sse()?);
    }

    if args.metrics {
        println!("{}", session.metrics().render_prometheus());
    }
    Ok(())
}
