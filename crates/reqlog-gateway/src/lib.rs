//! reqlog Gateway
//!
//! axum integration of the request logging pipeline:
//! - Request context capture with JSON/form body teeing
//! - Response body capture
//! - Performance timing with a significance threshold
//! - Scheduled flushing to dedicated log files

pub mod logging;
pub mod server;

pub use logging::{init_tracing, LoggingError, RequestSpan, TraceContext};
pub use server::context_middleware::{attach, lookup};
pub use server::{GatewayConfig, GatewayServer, PipelineState};
