//! # reqlog Core Library
//!
//! Framework-independent half of the request logging pipeline.
//!
//! ## Modules
//!
//! - `context` - Per-exchange request context shared by handle
//! - `record` - Log records and the serialized perf line
//! - `queue` - Bounded, drop-on-full log queue
//! - `flusher` - Scheduled drain/flush loop
//! - `performance` - Duration gate and method-level observer
//! - `tracer` - Trace id generation and timing spans
//! - `sink` - Log line destinations
//! - `truncate` - UTF-8 safe truncation and bounded JSON rendering

pub mod config;
pub mod context;
pub mod error;
pub mod flusher;
pub mod multimap;
pub mod performance;
pub mod queue;
pub mod record;
pub mod sink;
pub mod tracer;
pub mod truncate;

pub use config::HttpLogConfig;
pub use context::{ContextHandle, RequestContext, RESPONSE_TOO_LONG};
pub use error::{BusinessError, ConfigError, FlushError, SinkError};
pub use flusher::{FlushReport, LogFlusher};
pub use multimap::MultiValueMap;
pub use performance::{LogOptions, PerformanceLogger};
pub use queue::{BoundedLogQueue, QueueStats};
pub use record::{LogField, LogRecord, Payload, ResultCode};
pub use sink::{LogSink, MemorySink, TracingSink, PERF_TARGET, REQ_RES_TARGET};
pub use tracer::{DefaultTracer, PerfSpan, Tracer};
