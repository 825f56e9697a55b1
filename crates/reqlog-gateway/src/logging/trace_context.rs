//! Trace Context - Request correlation
//!
//! Resolves the trace id of an incoming request and provides the tracing
//! span every request runs in.

use axum::http::HeaderMap;
use reqlog_core::tracer::{generate_trace_id, parse_traceparent};
use tracing::{debug, info_span, Span};

/// B3 propagation header
pub const B3_TRACE_ID: &str = "x-b3-traceid";
/// W3C propagation header
pub const TRACEPARENT: &str = "traceparent";

/// Trace id propagated by the caller, B3 first then W3C
pub fn incoming_trace_id(headers: &HeaderMap) -> Option<String> {
    if let Some(id) = headers
        .get(B3_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(id.to_string());
    }

    headers
        .get(TRACEPARENT)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_traceparent)
        .map(str::to_string)
}

/// Trace context for a single request
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub method: String,
    pub path: String,
    /// Request start time
    pub started_at: std::time::Instant,
}

impl TraceContext {
    /// Create a trace context, continuing the caller's trace when present
    pub fn new(method: &str, path: &str, headers: &HeaderMap) -> Self {
        Self {
            trace_id: incoming_trace_id(headers).unwrap_or_else(generate_trace_id),
            method: method.to_string(),
            path: path.to_string(),
            started_at: std::time::Instant::now(),
        }
    }

    /// Get elapsed time since request started
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// Request span builder for structured logging
pub struct RequestSpan;

impl RequestSpan {
    /// Create a tracing span for an incoming request
    ///
    /// This span will automatically include trace_id in all child logs.
    pub fn enter(ctx: &TraceContext) -> Span {
        info_span!(
            "request",
            trace_id = %ctx.trace_id,
            method = %ctx.method,
            path = %ctx.path,
        )
    }

    pub fn log_entry(ctx: &TraceContext) {
        debug!("→ {} {}", ctx.method, ctx.path);
    }

    pub fn log_exit(ctx: &TraceContext, status: u16) {
        debug!("← {} ({}ms)", status, ctx.elapsed_ms());
    }
}
