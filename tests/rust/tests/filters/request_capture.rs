//! Request body teeing seen from the handler's side

use axum::{extract::Form, routing::post, Json, Router};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tests::fixtures::{body_text, form_request, json_request, record_everything, TestPipeline};
use tower::ServiceExt;

#[derive(Debug, Deserialize)]
struct Echo {
    a: String,
    b: String,
}

fn routes() -> Router {
    Router::new()
        .route(
            "/form",
            post(|Form(form): Form<Echo>| async move { format!("{}|{}", form.a, form.b) }),
        )
        .route(
            "/json",
            post(|Json(value): Json<Value>| async move { value.to_string() }),
        )
        .route("/raw", post(|body: String| async move { body }))
}

#[tokio::test]
async fn test_form_fields_reach_handler_and_context() {
    let pipeline = TestPipeline::new(record_everything());
    let response = pipeline
        .app(routes())
        .oneshot(form_request("/form", "a=1&b=hello%20world"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, "1|hello world");

    let records = pipeline.state.queue.drain(10);
    let ctx = records[0].context.as_ref().unwrap().snapshot();
    let form: BTreeMap<&str, &str> = ctx.form_data.iter().collect();
    assert_eq!(form, BTreeMap::from([("a", "1"), ("b", "hello world")]));
    assert!(ctx.request_body.is_none());
}

#[tokio::test]
async fn test_json_line_breaks_stripped_in_context_only() {
    let pipeline = TestPipeline::new(record_everything());
    let response = pipeline
        .app(routes())
        .oneshot(json_request("POST", "/json", "{\"x\":1}\r\n"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, r#"{"x":1}"#);

    let records = pipeline.state.queue.drain(10);
    let ctx = records[0].context.as_ref().unwrap().snapshot();
    assert_eq!(ctx.request_body.as_deref(), Some(r#"{"x":1}"#));
    assert!(ctx.form_data.is_empty());
}

#[tokio::test]
async fn test_disabled_request_capture_leaves_body_alone() {
    let mut config = record_everything();
    config.request.enable = false;
    let pipeline = TestPipeline::new(config);

    let response = pipeline
        .app(routes())
        .oneshot(json_request("POST", "/raw", "{\"x\":1}\r\n"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, "{\"x\":1}\r\n");

    let records = pipeline.state.queue.drain(10);
    let ctx = records[0].context.as_ref().unwrap().snapshot();
    assert!(ctx.request_body.is_none());
    assert!(ctx.form_data.is_empty());
}

#[tokio::test]
async fn test_both_toggles_off_attaches_nothing() {
    let mut config = record_everything();
    config.request.enable = false;
    config.response.enable = false;
    let pipeline = TestPipeline::new(config);

    let response = pipeline
        .app(routes())
        .oneshot(json_request("POST", "/raw", "{}"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, "{}");

    let records = pipeline.state.queue.drain(10);
    assert_eq!(records.len(), 1);
    assert!(records[0].context.is_none());
}

#[tokio::test]
async fn test_non_utf8_form_is_forwarded_verbatim() {
    let pipeline = TestPipeline::new(record_everything());
    let app = pipeline.app(routes());

    let mut request = form_request("/raw", "name=%E9&city=Lyon");
    request.headers_mut().insert(
        "content-type",
        "application/x-www-form-urlencoded; charset=ISO-8859-1"
            .parse()
            .unwrap(),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(body_text(response.into_body()).await, "name=%E9&city=Lyon");

    // No charset means UTF-8, but the escapes are not valid UTF-8
    let response = app
        .oneshot(form_request("/raw", "name=%E9"))
        .await
        .unwrap();
    assert_eq!(body_text(response.into_body()).await, "name=%E9");

    let records = pipeline.state.queue.drain(10);
    assert_eq!(records.len(), 2);
    let ctx = records[0].context.as_ref().unwrap().snapshot();
    assert_eq!(ctx.form_data.get_first("city"), Some("Lyon"));
    assert!(ctx.form_data.get_first("name").is_some());
}
