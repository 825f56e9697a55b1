//! Full chain: request in, perf and summary lines out

use axum::{http::StatusCode, routing::post, Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use tests::fixtures::{body_text, json_request, record_everything, TestPipeline};
use tests::HttpLogConfig;
use tower::ServiceExt;

async fn create_order(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["id"], 42);
    tokio::time::sleep(Duration::from_millis(120)).await;
    Json(json!({"status": "ok"}))
}

fn routes() -> Router {
    Router::new().route("/orders", post(create_order))
}

#[tokio::test]
async fn test_slow_order_is_logged_once() {
    let pipeline = TestPipeline::new(HttpLogConfig::default());
    let app = pipeline.app(routes());

    let response = app
        .oneshot(json_request("POST", "/orders", r#"{"id":42}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response.into_body()).await, r#"{"status":"ok"}"#);

    assert_eq!(pipeline.state.queue.len(), 1);
    let report = pipeline.state.flusher().flush_once();
    assert_eq!(report.written, 1);

    let lines = pipeline.perf_lines();
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert_eq!(line["service"], "orders");
    assert_eq!(line["result"], "0");
    assert_eq!(line["logType"], "http");
    assert_eq!(line["actionType"], "POST");
    let duration = line["duration"].as_i64().unwrap();
    assert!(duration >= 120, "duration {} should cover the handler", duration);
    assert!(duration < 2_000);
    assert!(line["inputs"].as_str().unwrap().contains(r#"{"id":42}"#));
    assert!(line["response"].as_str().unwrap().contains(r#"{"status":"ok"}"#));
    assert_eq!(line["traceId"].as_str().unwrap().len(), 32);

    let summaries = pipeline.req_res_sink.lines();
    assert_eq!(summaries.len(), 1);
    assert!(summaries[0].starts_with("orders | POST | - | - | "));
    assert!(summaries[0].contains(r#" | {"id":42} | 200 | "#));
}

#[tokio::test]
async fn test_fast_request_is_not_logged() {
    let pipeline = TestPipeline::new(HttpLogConfig::default());
    let app = pipeline.app(Router::new().route("/ping", post(|| async { "pong" })));

    let response = app
        .oneshot(json_request("POST", "/ping", "{}"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, "pong");

    assert!(pipeline.state.queue.is_empty());
    assert_eq!(pipeline.state.flusher().flush_once().drained, 0);
    assert!(pipeline.perf_sink.lines().is_empty());
}

#[tokio::test]
async fn test_incoming_trace_id_is_reused() {
    let pipeline = TestPipeline::new(record_everything());
    let app = pipeline.app(Router::new().route("/ping", post(|| async { "pong" })));

    let mut request = json_request("POST", "/ping", "{}");
    request.headers_mut().insert(
        "x-b3-traceid",
        "80f198ee56343ba864fe8b2a57d3eff7".parse().unwrap(),
    );
    let response = app.oneshot(request).await.unwrap();
    let _ = body_text(response.into_body()).await;

    pipeline.state.flusher().flush_once();
    assert_eq!(
        pipeline.perf_lines()[0]["traceId"],
        "80f198ee56343ba864fe8b2a57d3eff7"
    );
}
