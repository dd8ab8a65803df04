//! Analysis Flow Integration Tests
//!
//! Submission, retry/backoff, de-duplication and cancellation of the analysis
//! flow against a scripted backend.

use std::time::Duration;

use serde_json::json;

use aspirepath::services::analysis::state::{MSG_MALFORMED, MSG_NOT_FOUND};
use aspirepath::services::{AnalysisState, FlowError, ReportView, ReviewSource};
use aspirepath_client::{parse_http_error, ApiErrorKind};
use aspirepath_core::clamp_score;

use crate::support::{
    analysis_envelope, analyze_path, app, review_envelope, ScriptedTransport, RANDOM, RELEVANT,
};

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_abc123_report_and_review() {
    let transport = ScriptedTransport::new();
    transport.push(analyze_path("abc123"), Ok(analysis_envelope("abc123", 12.0, "Data Analyst")));
    transport.push(RELEVANT, Ok(review_envelope("Noor Haddad", false)));
    let state = app(transport.clone());

    let result = state.analysis().submit_response_id("abc123").await.unwrap();
    assert_eq!(result.display_score(), 10);

    let review = state.analysis().wait_for_review().await.unwrap();
    assert_eq!(review.source, Some(ReviewSource::Relevant));

    // The review lookup used the top career path as program.
    let bodies = transport.json_bodies(RELEVANT);
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["profileData"]["program"], "Data Analyst");
    assert_eq!(
        bodies[0]["profileData"]["skills"],
        json!(["Excel", "Communication", "Attention to Detail", "SQL", "Python", "Statistics"])
    );

    let text = ReportView::new(&result, Some(&review)).to_string();
    assert!(text.contains("Automation risk: 10/10"));
    for strength in ["Excel", "Communication", "Attention to Detail"] {
        assert!(text.contains(strength), "missing strength {}", strength);
    }
    assert!(text.contains("Noor Haddad"));

    let snapshot = state.analysis().snapshot();
    match snapshot.state {
        AnalysisState::Succeeded { review, .. } => assert!(review.is_resolved()),
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_server_errors_then_success() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport
        .push(&path, Err(parse_http_error(503, "")))
        .push(&path, Err(parse_http_error(500, r#"{"detail":"boom"}"#)))
        .push(&path, Ok(analysis_envelope("abc123", 7.0, "Data Analyst")));
    let state = app(transport.clone());

    let started = tokio::time::Instant::now();
    let result = state.analysis().submit_response_id("abc123").await.unwrap();

    assert_eq!(result.display_score(), 7);
    assert_eq!(transport.calls_to(&path), 3);
    // 1s then 2s of backoff.
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(state.analysis().snapshot().state.name(), "succeeded");
}

#[tokio::test(start_paused = true)]
async fn test_not_found_fails_after_one_attempt() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("missing");
    transport.always(
        &path,
        Duration::ZERO,
        Err(parse_http_error(404, r#"{"detail":"Response not found"}"#)),
    );
    let state = app(transport.clone());

    let err = state.analysis().submit_response_id("missing").await.unwrap_err();
    match err {
        FlowError::Failed(failure) => {
            assert_eq!(failure.kind, ApiErrorKind::Client);
            assert_eq!(failure.status, Some(404));
            assert_eq!(failure.message, MSG_NOT_FOUND);
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(transport.calls_to(&path), 1);
    assert!(state.analysis().snapshot().state.failure().is_some());
}

#[tokio::test]
async fn test_malformed_response_is_not_retried() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport.always(&path, Duration::ZERO, Ok(json!({ "success": true })));
    let state = app(transport.clone());

    let err = state.analysis().submit_response_id("abc123").await.unwrap_err();
    assert!(matches!(err, FlowError::Failed(ref f) if f.message == MSG_MALFORMED));
    assert_eq!(transport.calls_to(&path), 1);
}

#[tokio::test]
async fn test_application_failure_message() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport.push(
        &path,
        Ok(json!({ "success": false, "error": "Response has not been processed yet" })),
    );
    let state = app(transport.clone());

    let err = state.analysis().submit_response_id("abc123").await.unwrap_err();
    assert_eq!(err.to_string(), "Response has not been processed yet");
    assert!(state.analysis().snapshot().state.result().is_none());
}

// ============================================================================
// De-duplication
// ============================================================================

#[tokio::test]
async fn test_concurrent_same_id_single_call() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport.push_delayed(
        &path,
        Duration::from_millis(100),
        Ok(analysis_envelope("abc123", 5.0, "Data Analyst")),
    );
    let state = app(transport.clone());

    // Same flow: the second submission is rejected while the first runs.
    let flow = state.analysis();
    let (first, second) = tokio::join!(
        flow.submit_response_id("abc123"),
        flow.submit_response_id("abc123")
    );
    assert!(first.is_ok());
    assert_eq!(second.unwrap_err(), FlowError::Busy);
    assert_eq!(transport.calls_to(&path), 1);
}

#[tokio::test]
async fn test_concurrent_flows_share_one_call() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport.push_delayed(
        &path,
        Duration::from_millis(100),
        Ok(analysis_envelope("abc123", 5.0, "Data Analyst")),
    );
    let state = app(transport.clone());

    // Two views of the same session join one in-flight request.
    let a = state.new_analysis_flow();
    let b = state.new_analysis_flow();
    let (ra, rb) = tokio::join!(a.submit_response_id("abc123"), b.submit_response_id("abc123"));

    assert_eq!(ra.unwrap(), rb.unwrap());
    assert_eq!(transport.calls_to(&path), 1);
    assert_eq!(state.store().dedup().pending_count(), 0);
}

#[tokio::test]
async fn test_one_analysis_per_app_across_flows() {
    let transport = ScriptedTransport::new();
    transport.push_delayed(
        analyze_path("a"),
        Duration::from_millis(100),
        Ok(analysis_envelope("a", 5.0, "Data Analyst")),
    );
    transport.push(analyze_path("b"), Ok(analysis_envelope("b", 8.0, "Data Engineer")));
    let state = app(transport.clone());

    let first = state.new_analysis_flow();
    let second = state.new_analysis_flow();
    let (ra, rb) = tokio::join!(
        first.submit_response_id("a"),
        second.submit_response_id("b")
    );

    assert!(ra.is_ok());
    assert_eq!(rb.unwrap_err(), FlowError::Busy);
    assert_eq!(transport.calls_to(&analyze_path("b")), 0);
    assert_eq!(second.snapshot().state, AnalysisState::Idle);

    // Free again once the first analysis is done.
    assert_eq!(second.submit_response_id("b").await.unwrap().display_score(), 8);
}

#[tokio::test(start_paused = true)]
async fn test_reset_frees_the_app_for_other_flows() {
    let transport = ScriptedTransport::new();
    transport.push_delayed(
        analyze_path("a"),
        Duration::from_secs(8),
        Ok(analysis_envelope("a", 5.0, "Data Analyst")),
    );
    transport.push(analyze_path("b"), Ok(analysis_envelope("b", 8.0, "Data Engineer")));
    let state = app(transport.clone());
    let main = state.analysis().clone();
    let side = state.new_analysis_flow();

    let runner = main.clone();
    let task = tokio::spawn(async move { runner.submit_response_id("a").await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(side.submit_response_id("b").await.unwrap_err(), FlowError::Busy);

    main.reset();
    assert!(side.submit_response_id("b").await.is_ok());
    assert_eq!(task.await.unwrap().unwrap_err(), FlowError::Cancelled);
}

// ============================================================================
// Cancellation and invalidation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_submission() {
    let transport = ScriptedTransport::new();
    let path = analyze_path("abc123");
    transport.push_delayed(
        &path,
        Duration::from_secs(8),
        Ok(analysis_envelope("abc123", 5.0, "Data Analyst")),
    );
    let state = app(transport.clone());
    let flow = state.analysis().clone();
    let mut updates = flow.subscribe();

    let runner = flow.clone();
    let task = tokio::spawn(async move { runner.submit_response_id("abc123").await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    flow.reset();
    assert_eq!(task.await.unwrap().unwrap_err(), FlowError::Cancelled);

    updates.borrow_and_update();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(flow.snapshot().state, AnalysisState::Idle);
    assert_eq!(transport.completed(), 0);
    assert_eq!(state.store().dedup().pending_count(), 0);
}

#[tokio::test]
async fn test_new_submission_replaces_result() {
    let transport = ScriptedTransport::new();
    transport.push(analyze_path("first"), Ok(analysis_envelope("first", 3.0, "Data Analyst")));
    transport.push_delayed(
        analyze_path("second"),
        Duration::from_millis(50),
        Ok(analysis_envelope("second", 9.0, "Data Engineer")),
    );
    transport.always(RELEVANT, Duration::ZERO, Ok(review_envelope("Ivy", false)));
    let state = app(transport.clone());
    let flow = state.analysis().clone();

    flow.submit_response_id("first").await.unwrap();
    let mut updates = flow.subscribe();

    let runner = flow.clone();
    let task = tokio::spawn(async move { runner.submit_response_id("second").await });

    let submitting = updates
        .wait_for(|s| matches!(s.state, AnalysisState::Submitting { .. }))
        .await
        .unwrap()
        .clone();
    assert!(submitting.state.result().is_none());

    let second = task.await.unwrap().unwrap();
    assert_eq!(second.display_score(), 9);
    assert_eq!(
        flow.snapshot().state.result().map(|r| r.display_score()),
        Some(9)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_silences_review_continuation() {
    let transport = ScriptedTransport::new();
    transport.push(analyze_path("abc123"), Ok(analysis_envelope("abc123", 5.0, "Data Analyst")));
    transport.push_delayed(
        RELEVANT,
        Duration::from_secs(5),
        Ok(review_envelope("Late Reviewer", false)),
    );
    let state = app(transport.clone());
    let flow = state.analysis();

    flow.submit_response_id("abc123").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    flow.reset();

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(flow.snapshot().state, AnalysisState::Idle);
    assert_eq!(transport.calls_to(RANDOM), 0);
    assert!(state.store().reviews().is_empty());
}

// ============================================================================
// Score display
// ============================================================================

#[test]
fn test_clamped_score_always_in_range() {
    let samples = [
        f64::NEG_INFINITY,
        -1e9,
        -3.2,
        0.0,
        0.49,
        1.0,
        5.5,
        9.51,
        10.0,
        10.4,
        12.0,
        1e12,
        f64::INFINITY,
        f64::NAN,
    ];
    for s in samples {
        let c = clamp_score(s);
        assert!((1..=10).contains(&c), "clamp({}) = {}", s, c);
    }
}
