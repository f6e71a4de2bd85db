//! Integration tests for upstream connection slots

use crate::integration::mock_server::*;
use futures::StreamExt;
use lemonade_guard::types::DetectorsConfig;
use lemonade_guard::{ChatSessionBuilder, GuardConfig, HttpTransport, OutputEvent, UpstreamRequest};
use std::sync::Arc;
use std::time::Duration;

fn pooled_config(base_url: &str, max_connections: usize, per_host: usize) -> GuardConfig {
    let mut config = test_config();
    config.upstream.base_url = Some(base_url.to_string());
    config.upstream.pool.max_connections = max_connections;
    config.upstream.pool.max_connections_per_host = per_host;
    config
}

fn lemon_request() -> UpstreamRequest {
    UpstreamRequest {
        model: "llama32".into(),
        system_prompt: "You only talk about lemons.".into(),
        user_message: "Tell me about lemons".into(),
        stream: true,
        max_tokens: 200,
        detectors: DetectorsConfig::standard(&[]),
    }
}

fn two_chunk_body() -> String {
    sse_body(&[
        content_frame("Lemons are citrus."),
        content_frame("They are sour."),
    ])
}

#[tokio::test]
async fn test_per_host_limit_caps_open_responses() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_sse_stream(&two_chunk_body(), 2).await;
    let config = pooled_config(&fixture.base_url, 200, 1);
    let transport = HttpTransport::new(&config.upstream).unwrap();
    assert_eq!(transport.available_slots(), 1);

    let first = transport.execute_stream(&lemon_request()).await.unwrap();
    assert_eq!(transport.available_slots(), 0);

    // The host slot is taken, so a second response has to wait.
    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        transport.execute_stream(&lemon_request()),
    )
    .await;
    assert!(blocked.is_err());
    assert_eq!(transport.available_slots(), 0);

    drop(first);
    assert_eq!(transport.available_slots(), 1);

    let second = transport.execute_stream(&lemon_request()).await.unwrap();
    assert_eq!(transport.available_slots(), 0);
    drop(second);
    assert_eq!(transport.available_slots(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_global_limit_applies_below_per_host_limit() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_sse_stream(&two_chunk_body(), 1).await;
    let config = pooled_config(&fixture.base_url, 3, 100);
    let transport = HttpTransport::new(&config.upstream).unwrap();
    assert_eq!(transport.available_slots(), 3);

    let open = transport.execute_stream(&lemon_request()).await.unwrap();
    assert_eq!(transport.available_slots(), 2);
    drop(open);
    assert_eq!(transport.available_slots(), 3);
}

#[tokio::test]
async fn test_dropping_turn_mid_stream_releases_slot() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_sse_stream(&two_chunk_body(), 1).await;
    let config = pooled_config(&fixture.base_url, 4, 100);
    let transport = Arc::new(HttpTransport::new(&config.upstream).unwrap());
    let session = ChatSessionBuilder::new(config)
        .upstream(transport.clone())
        .build()
        .unwrap();

    let mut events = session.submit_turn("Tell me about lemons");
    assert_eq!(
        events.next().await,
        Some(OutputEvent::Chunk("Lemons are citrus.\n".into()))
    );
    assert_eq!(transport.available_slots(), 3);

    drop(events);
    assert_eq!(transport.available_slots(), 4);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_cancelled_turn_releases_slot_while_stream_is_held() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_sse_stream(&two_chunk_body(), 1).await;
    let config = pooled_config(&fixture.base_url, 4, 100);
    let transport = Arc::new(HttpTransport::new(&config.upstream).unwrap());
    let session = ChatSessionBuilder::new(config)
        .upstream(transport.clone())
        .build()
        .unwrap();

    let (mut events, cancel) = session.submit_turn_with_cancel("Tell me about lemons");
    assert_eq!(
        events.next().await,
        Some(OutputEvent::Chunk("Lemons are citrus.\n".into()))
    );
    assert_eq!(transport.available_slots(), 3);

    cancel.cancel();
    assert_eq!(events.next().await, None);
    assert_eq!(transport.available_slots(), 4);
    assert_eq!(events.next().await, None);
}
