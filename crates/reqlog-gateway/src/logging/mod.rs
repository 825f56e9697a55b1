//! Centralized Logging Infrastructure
//!
//! Provides structured logging with:
//! - Trace IDs for request correlation
//! - Colored console output
//! - File logging with rotation, one file per dedicated target

mod subscriber;
mod trace_context;

pub use subscriber::{init_tracing, LoggingError, DEFAULT_FILTER};
pub use trace_context::{incoming_trace_id, RequestSpan, TraceContext, B3_TRACE_ID, TRACEPARENT};
