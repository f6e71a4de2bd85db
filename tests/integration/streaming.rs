//! Integration tests for guarded streaming turns

use crate::integration::mock_server::*;
use futures::StreamExt;
use lemonade_guard::{DetectorCategory, Direction, OutputEvent};

#[tokio::test]
async fn test_safe_input_streams_chunks_then_done() {
    let mut fixture = MockServerFixture::new().await;
    let body = sse_body(&[
        content_frame("Lemons are rich in vitamin C."),
        content_frame("They grow on small evergreen trees."),
    ]);
    let mock = fixture.mock_sse_stream(&body, 1).await;
    let session = fixture.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![
            OutputEvent::Chunk("Lemons are rich in vitamin C.\n".into()),
            OutputEvent::Chunk("They grow on small evergreen trees.\n".into()),
            OutputEvent::Done,
        ]
    );
    mock.assert_async().await;
    let snap = session.metrics().snapshot();
    assert_eq!(snap.total_requests, 1);
    assert_eq!(snap.local_blocks, 0);
}

#[tokio::test]
async fn test_competitor_fruit_is_blocked_locally() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_sse_stream(&sse_body(&[]), 0).await;
    let session = fixture.session(test_config());

    let events = collect(&session, "Tell me about apples").await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        OutputEvent::Blocked { message, category } => {
            assert_eq!(*category, DetectorCategory::Regex);
            assert!(message.starts_with("🍏 I can only discuss lemons!"));
            assert!(message.ends_with(" Is there anything else I can help you with?"));
        }
        other => panic!("expected Blocked, got {:?}", other),
    }
    mock.assert_async().await;

    let snap = session.metrics().snapshot();
    assert_eq!(snap.total_requests, 1);
    assert_eq!(snap.local_blocks, 1);
    assert_eq!(snap.detection_count("regex_competitor", Direction::Input), 1);
}

#[tokio::test]
async fn test_output_detection_aborts_after_chunks() {
    let mut fixture = MockServerFixture::new().await;
    let body = sse_body(&[
        content_frame("Lemons are"),
        hap_output_frame(0.9),
        content_frame("never delivered"),
    ]);
    let _mock = fixture.mock_sse_stream(&body, 1).await;
    let session = fixture.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], OutputEvent::Chunk("Lemons are\n".into()));
    assert_eq!(
        events[1],
        OutputEvent::Blocked {
            message: "🤬 The response was blocked for containing potentially harmful or inappropriate content. Is there anything else I can help you with?".into(),
            category: DetectorCategory::Hap,
        }
    );
    assert_eq!(
        session.metrics().snapshot().detection_count("hap", Direction::Output),
        1
    );
}

#[tokio::test]
async fn test_request_omits_input_pattern_detector() {
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[content_frame("Sure.")])]);
    let session = upstream.session(test_config());

    let events = collect(&session, "How do I juice a lemon?").await;
    assert_eq!(events.last(), Some(&OutputEvent::Done));

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.user_message, "How do I juice a lemon?");
    assert_eq!(req.system_prompt, "You only talk about lemons.");
    assert!(req.stream);
    assert!(!req.detectors.input.contains_key("regex_competitor"));
    assert!(req.detectors.input.contains_key("prompt_injection"));
    let output_regex = &req.detectors.output["regex_competitor"]["regex"];
    assert_eq!(
        output_regex.as_array().map(|a| a.len()),
        Some(session.filter().patterns().len())
    );
}

#[tokio::test]
async fn test_frames_split_at_arbitrary_points() {
    let body = sse_body(&[content_frame("Zitrone heißt lemon.")]).into_bytes();
    // Cut inside the two-byte 'ß' and inside the `data:` prefix.
    let cut_a = body.iter().position(|b| *b == 0xC3).unwrap() + 1;
    let pieces = vec![body[..3].to_vec(), body[3..cut_a].to_vec(), body[cut_a..].to_vec()];
    let upstream = ScriptedUpstream::new(vec![Scripted::Body(pieces)]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Tell me about lemons").await;

    assert_eq!(
        events,
        vec![
            OutputEvent::Chunk("Zitrone heißt lemon.\n".into()),
            OutputEvent::Done
        ]
    );
}

#[tokio::test]
async fn test_noise_and_keepalives_are_ignored() {
    let body = format!(
        ": keep-alive\n\nevent: message\ndata: not-json\n\ndata: {}\n\ndata: [DONE]\n\ndata: {}\n\n",
        content_frame("Only lemons here."),
        content_frame("after done")
    );
    let upstream = ScriptedUpstream::new(vec![Scripted::Body(vec![body.into_bytes()])]);
    let session = upstream.session(test_config());

    let events = collect(&session, "lemon facts").await;

    assert_eq!(
        events,
        vec![OutputEvent::Chunk("Only lemons here.\n".into()), OutputEvent::Done]
    );
}

#[tokio::test]
async fn test_input_detection_blocks_before_any_chunk() {
    let frame = serde_json::json!({
        "warnings": [{"type": "UNSUITABLE_INPUT"}],
        "detections": {"input": [{"results": [{"detector_id": "language_detection", "score": 0.97}]}]}
    })
    .to_string();
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[frame])]);
    let session = upstream.session(test_config());

    let events = collect(&session, "Parle-moi des citrons").await;

    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        OutputEvent::Blocked { category: DetectorCategory::Language, message }
            if message.starts_with("🇬🇧 I can only communicate in English.")
    ));
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_upstream_error_event_maps_to_too_long_notice() {
    let body = "event: error\ndata: {\"code\":400,\"details\":\"max_tokens exceeds the context window\"}\n\n";
    let upstream = ScriptedUpstream::new(vec![Scripted::Body(vec![body.as_bytes().to_vec()])]);
    let session = upstream.session(test_config());

    let events = collect(&session, "lemon").await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        OutputEvent::Error(message) => assert!(message.starts_with("Your message is too long!")),
        other => panic!("expected Error, got {:?}", other),
    }
    assert_eq!(upstream.calls(), 1);
}

#[tokio::test]
async fn test_other_upstream_error_event_is_generic() {
    let body = "event: error\ndata: {\"details\":\"detector unavailable\"}\n\n";
    let upstream = ScriptedUpstream::new(vec![Scripted::Body(vec![body.as_bytes().to_vec()])]);
    let session = upstream.session(test_config());

    let events = collect(&session, "lemon").await;

    assert_eq!(
        events,
        vec![OutputEvent::Error(
            "Sorry, something went wrong. Please try again.".into()
        )]
    );
}

#[tokio::test]
async fn test_cancel_handle_ends_turn() {
    let upstream = ScriptedUpstream::new(vec![Scripted::BodyThenHang(vec![format!(
        "data: {}\n\n",
        content_frame("Lemons")
    )
    .into_bytes()])]);
    let session = upstream.session(test_config());

    let (mut events, cancel) = session.submit_turn_with_cancel("lemons please");
    assert_eq!(events.next().await, Some(OutputEvent::Chunk("Lemons\n".into())));
    cancel.cancel();
    assert!(cancel.is_cancelled());
    assert_eq!(events.next().await, None);
}

#[tokio::test]
async fn test_turn_is_lazy() {
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[content_frame("x")])]);
    let session = upstream.session(test_config());

    let events = session.submit_turn("lemons");
    assert_eq!(upstream.calls(), 0);
    assert_eq!(session.metrics().snapshot().total_requests, 0);
    drop(events);
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_turns_share_metrics() {
    let upstream = ScriptedUpstream::new(vec![Scripted::frames(&[content_frame("Lemon.")])]);
    let session = upstream.session(test_config());

    let turns = (0..20).map(|i| {
        let session = session.clone();
        tokio::spawn(async move {
            let message = if i % 2 == 0 { "lemons" } else { "bananas" };
            session.submit_turn(message).collect::<Vec<_>>().await
        })
    });
    for turn in futures::future::join_all(turns).await {
        let events = turn.unwrap();
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    let snap = session.metrics().snapshot();
    assert_eq!(snap.total_requests, 20);
    assert_eq!(snap.local_blocks, 10);
    assert_eq!(upstream.calls(), 10);
}
