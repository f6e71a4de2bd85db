//! Integration tests for failure paths and retries

use crate::integration::mock_server::*;
use lemonade_guard::{ChatSessionBuilder, OutputEvent};
use std::time::Duration;

const TOO_LONG: &str = "Your message is too long! Please keep your question short and simple - ideally under 100 characters.";

#[tokio::test]
async fn test_over_long_message_never_reaches_upstream() {
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[content_frame("x")])]);
    let session = upstream.session(test_config());

    let events = collect(&session, &"a".repeat(101)).await;

    assert_eq!(events, vec![OutputEvent::Error(TOO_LONG.into())]);
    assert_eq!(upstream.calls(), 0);
    assert_eq!(session.metrics().snapshot().total_requests, 1);
}

#[tokio::test]
async fn test_length_limit_counts_characters() {
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[content_frame("ok")])]);
    let session = upstream.session(test_config());

    // 100 two-byte characters: over 100 bytes, exactly at the limit.
    let events = collect(&session, &"é".repeat(100)).await;

    assert_eq!(events.last(), Some(&OutputEvent::Done));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_non_success_status_is_not_retried() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_error_response(500, r#"{"error":"internal detail that must not leak"}"#, 1)
        .await;
    let session = fixture.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(events, vec![OutputEvent::Error("API error: 500".into())]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_stream_exhausts_retries_over_http() {
    let mut fixture = MockServerFixture::new().await;
    // max_retries = 2 means three attempts in total.
    let mock = fixture.mock_sse_stream("", 3).await;
    let session = fixture.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![OutputEvent::Error("No response received. Please try again.".into())]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_always_failing_upstream_is_attempted_max_retries_plus_one() {
    let upstream = ScriptedUpstream::new(vec![Scripted::ConnectionReset]);
    let mut config = test_config();
    config.retry.max_retries = 3;
    let session = upstream.session(config);

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![OutputEvent::Error(
            "Sorry, the assistant could not be reached. Please try again.".into()
        )]
    );
    assert_eq!(upstream.calls(), 4);
}

#[tokio::test]
async fn test_empty_stream_then_recovery_retries_once_without_delay() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::empty(),
        Scripted::frames(&[content_frame("Fresh connection, fresh lemons.")]),
    ]);
    let mut config = test_config();
    // Any backoff would blow the timeout below; the first empty-stream retry has none.
    config.retry.base_delay_ms = 10_000;
    config.retry.max_delay_ms = 10_000;
    let session = upstream.session(config);

    let events = tokio::time::timeout(
        Duration::from_secs(2),
        collect(&session, "Tell me about lemons"),
    )
    .await
    .expect("no backoff before the first empty-stream retry");

    assert_eq!(
        events,
        vec![
            OutputEvent::Chunk("Fresh connection, fresh lemons.\n".into()),
            OutputEvent::Done
        ]
    );
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_transport_failure_then_recovery() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::ConnectionReset,
        Scripted::frames(&[content_frame("Back online.")]),
    ]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(events.last(), Some(&OutputEvent::Done));
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_stream_error_before_output_is_retried() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::BodyThenTimeout(vec![b": ping\n\n".to_vec()]),
        Scripted::frames(&[content_frame("Second try.")]),
    ]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![OutputEvent::Chunk("Second try.\n".into()), OutputEvent::Done]
    );
    assert_eq!(upstream.calls(), 2);
}

#[tokio::test]
async fn test_stream_error_after_output_ends_turn() {
    let upstream = ScriptedUpstream::new(vec![
        Scripted::BodyThenTimeout(vec![
            format!("data: {}\n\n", content_frame("Half an ans")).into_bytes()
        ]),
        Scripted::frames(&[content_frame("must not be replayed")]),
    ]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![
            OutputEvent::Chunk("Half an ans\n".into()),
            OutputEvent::Error("Request timed out. Please try again.".into()),
        ]
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_status_error_from_custom_upstream_fails_fast() {
    let upstream = ScriptedUpstream::new(vec![Scripted::Status(503)]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(events, vec![OutputEvent::Error("API error: 503".into())]);
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_turn_deadline_bounds_a_silent_upstream() {
    let upstream = ScriptedUpstream::new(vec![Scripted::BodyThenHang(Vec::new())]);
    let mut config = test_config();
    config.upstream.timeouts.turn_ms = 50;
    let session = upstream.session(config);

    let events = tokio::time::timeout(
        Duration::from_secs(5),
        collect(&session, "Tell me about lemons"),
    )
    .await
    .expect("turn deadline fires");

    assert_eq!(
        events,
        vec![OutputEvent::Error("Request timed out. Please try again.".into())]
    );
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_unreachable_orchestrator_reports_generic_error() {
    let mut config = test_config();
    config.upstream.timeouts.connect_ms = 500;
    let session = ChatSessionBuilder::new(config)
        .base_url_override("http://127.0.0.1:1")
        .build()
        .unwrap();

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        OutputEvent::Error(message) => {
            assert!(!message.contains("127.0.0.1"));
            assert!(message.contains("Please try again."));
        }
        other => panic!("expected Error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_custom_patterns_fail_session_build() {
    let mut config = test_config();
    config.patterns = Some(vec!["(unbalanced".into()]);

    let result = ChatSessionBuilder::new(config)
        .upstream(ScriptedUpstream::new(vec![]))
        .build();
    let err = result.err().expect("invalid pattern rejected");
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("patterns[0]")
    );
}
