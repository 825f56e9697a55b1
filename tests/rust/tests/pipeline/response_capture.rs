//! Response body capture through the full chain

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use pretty_assertions::assert_eq;
use tests::fixtures::{body_text, record_everything, TestPipeline};
use tower::ServiceExt;

fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::get(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

fn routes() -> Router {
    Router::new()
        .route("/big", get(|| async { "x".repeat(5_000) }))
        .route(
            "/image",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![1u8, 2, 3]) }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
        )
}

#[tokio::test]
async fn test_oversize_response_uses_placeholder() {
    let pipeline = TestPipeline::new(record_everything());
    let response = pipeline.app(routes()).oneshot(get_request("/big")).await.unwrap();

    // The client still receives the full body
    assert_eq!(body_text(response.into_body()).await.len(), 5_000);

    pipeline.state.flusher().flush_once();
    assert_eq!(pipeline.perf_lines()[0]["response"], "response too long to log");
}

#[tokio::test]
async fn test_binary_response_is_not_captured() {
    let pipeline = TestPipeline::new(record_everything());
    let response = pipeline.app(routes()).oneshot(get_request("/image")).await.unwrap();
    let _ = body_text(response.into_body()).await;

    let records = pipeline.state.queue.drain(10);
    let ctx = records[0].context.as_ref().unwrap().snapshot();
    assert_eq!(ctx.status, Some(200));
    assert!(ctx.response_body().is_none());
}

#[tokio::test]
async fn test_response_capture_can_be_disabled() {
    let mut config = record_everything();
    config.response.enable = false;
    let pipeline = TestPipeline::new(config);
    let response = pipeline.app(routes()).oneshot(get_request("/big")).await.unwrap();
    let _ = body_text(response.into_body()).await;

    pipeline.state.flusher().flush_once();
    assert!(pipeline.perf_lines()[0]["response"].is_null());
}

#[tokio::test]
async fn test_server_error_is_a_failure() {
    let pipeline = TestPipeline::new(record_everything());
    let response = pipeline.app(routes()).oneshot(get_request("/broken")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response.into_body()).await, "boom");

    pipeline.state.flusher().flush_once();
    let line = &pipeline.perf_lines()[0];
    assert_eq!(line["result"], "1");
    assert_eq!(line["response"], "boom");
    assert!(pipeline.req_res_sink.lines()[0].contains(" | 500 | "));
}
