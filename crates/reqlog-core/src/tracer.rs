//! Trace id generation and lightweight timing spans

use std::time::{Duration, Instant};
use tracing::debug;

/// Generate a 32 hex character trace id
pub fn generate_trace_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Extract the trace id from a W3C `traceparent` value
/// (`version-traceid-parentid-flags`)
pub fn parse_traceparent(value: &str) -> Option<&str> {
    let mut parts = value.trim().split('-');
    let _version = parts.next()?;
    let trace_id = parts.next()?;
    let _parent = parts.next()?;
    let _flags = parts.next()?;

    let valid = trace_id.len() == 32
        && trace_id.chars().all(|c| c.is_ascii_hexdigit())
        && trace_id.chars().any(|c| c != '0');
    valid.then_some(trace_id)
}

/// Timing span handed out by a [`Tracer`]
#[derive(Debug)]
pub struct PerfSpan {
    trace_id: String,
    name: String,
    started_at: Instant,
}

impl PerfSpan {
    pub fn new(trace_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            name: name.into(),
            started_at: Instant::now(),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the span and return its elapsed time
    pub fn finish(self) -> Duration {
        let elapsed = self.started_at.elapsed();
        debug!(
            trace_id = %self.trace_id,
            "span {} finished ({}ms)",
            self.name,
            elapsed.as_millis()
        );
        elapsed
    }
}

pub trait Tracer: Send + Sync {
    /// Open a span, continuing `parent_trace_id` when one is given
    fn next_span(&self, name: &str, parent_trace_id: Option<&str>) -> PerfSpan;
}

/// Reuses the caller's trace id or generates a fresh one
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTracer;

impl Tracer for DefaultTracer {
    fn next_span(&self, name: &str, parent_trace_id: Option<&str>) -> PerfSpan {
        let trace_id = parent_trace_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(generate_trace_id);
        PerfSpan::new(trace_id, name)
    }
}
