//! Performance gate and filter tests

use axum::{routing::get, Router};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tests::fixtures::{body_text, record, record_everything, TestPipeline};
use tests::{BoundedLogQueue, HttpLogConfig, ResultCode};
use tower::ServiceExt;

use reqlog_core::{Payload, PerformanceLogger};

fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[test]
fn test_threshold_boundary() {
    let perf = PerformanceLogger::new(Arc::new(BoundedLogQueue::new(10)), 50);

    assert!(!perf.submit(record("fast", 49)));
    assert!(perf.submit(record("edge", 50)));
    assert!(perf.submit(record("slow", 51)));
    assert_eq!(perf.queue().len(), 2);
}

#[tokio::test]
async fn test_excluded_paths_are_never_timed() {
    let pipeline = TestPipeline::new(record_everything());
    let app = pipeline.app(
        Router::new()
            .route("/health", get(|| async { "up" }))
            .route("/actuator/info", get(|| async { "info" })),
    );

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(body_text(response.into_body()).await, "up");
    let response = app.oneshot(get_request("/actuator/info")).await.unwrap();
    assert_eq!(body_text(response.into_body()).await, "info");

    assert!(pipeline.state.queue.is_empty());
}

#[tokio::test]
async fn test_slow_handler_above_default_threshold() {
    let pipeline = TestPipeline::new(HttpLogConfig::default());
    let app = pipeline.app(Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            "done"
        }),
    ));

    let response = app.oneshot(get_request("/slow")).await.unwrap();
    let _ = body_text(response.into_body()).await;

    let records = pipeline.state.queue.drain(10);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].service, "slow");
    assert!(records[0].duration_ms() >= 80);
    assert_eq!(records[0].result, ResultCode::Success);
}

#[tokio::test]
async fn test_panic_is_recorded_then_resumed() {
    let pipeline = TestPipeline::new(record_everything());
    let app = pipeline.app(Router::new().route(
        "/panic",
        get(|| async {
            if true {
                panic!("handler exploded");
            }
            "unreachable"
        }),
    ));

    let outcome = AssertUnwindSafe(app.oneshot(get_request("/panic")))
        .catch_unwind()
        .await;
    assert!(outcome.is_err());

    let records = pipeline.state.queue.drain(10);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].result, ResultCode::Failure);
    assert_eq!(
        records[0].output,
        Some(Payload::Text("handler exploded".to_string()))
    );
}
