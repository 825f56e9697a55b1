//! Performance timing middleware
//!
//! Innermost layer of the logging chain. Times the routes and queues a record
//! when the exchange is slower than the configured threshold.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use reqlog_core::{LogRecord, Payload, ResultCode};

use super::context_middleware::lookup;
use super::state::PipelineState;
use crate::logging::{incoming_trace_id, TraceContext};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Result code for a finished exchange
pub fn result_for_status(status: u16) -> ResultCode {
    if (500..600).contains(&status) {
        ResultCode::Failure
    } else {
        ResultCode::Success
    }
}

/// Text of a panic payload, if it carried a message
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Outcome text for a failed exchange.
///
/// A 5xx response only gets its status reason when no context is capturing
/// the response body.
fn failure_output(
    outcome: &Result<Response, Box<dyn Any + Send>>,
    body_captured: bool,
) -> Option<Payload> {
    match outcome {
        Ok(response)
            if !body_captured
                && result_for_status(response.status().as_u16()) == ResultCode::Failure =>
        {
            let status = response.status();
            let text = match status.canonical_reason() {
                Some(reason) => format!("{} {}", status.as_u16(), reason),
                None => status.as_u16().to_string(),
            };
            Some(Payload::Text(text))
        }
        Ok(_) => None,
        Err(panic) => Some(Payload::Text(panic_message(panic.as_ref()))),
    }
}

/// Performance middleware
///
/// A panicking handler is recorded as a failure and the panic is resumed.
pub async fn performance_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if state.config.is_excluded(&path) {
        return next.run(request).await;
    }

    let ctx = lookup(&request);
    let parent = request
        .extensions()
        .get::<TraceContext>()
        .map(|t| t.trace_id.clone())
        .or_else(|| incoming_trace_id(request.headers()));
    let method = request.method().to_string();
    let service = path.strip_prefix('/').unwrap_or(&path).to_string();

    let span = state.perf.tracer().next_span(&service, parent.as_deref());
    let start_time = now_ms();

    let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;

    let end_time = now_ms();
    if state.perf.should_record(end_time - start_time) {
        let mut record = LogRecord::new(service, start_time, end_time);
        record.trace_id = Some(span.trace_id().to_string());
        record.action_type = method;
        record.result = match &outcome {
            Ok(response) => result_for_status(response.status().as_u16()),
            Err(_) => ResultCode::Failure,
        };
        let body_captured = ctx.as_ref().is_some_and(|c| c.lock().read_response_enabled);
        record.output = failure_output(&outcome, body_captured);
        record.context = ctx;
        span.finish();
        state.perf.submit(record);
    }

    match outcome {
        Ok(response) => response,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
