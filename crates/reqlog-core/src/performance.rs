//! Duration gate in front of the log queue

use serde::Serialize;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use crate::context::ContextHandle;
use crate::error::BusinessError;
use crate::queue::BoundedLogQueue;
use crate::record::{LogRecord, Payload, ResultCode};
use crate::tracer::{DefaultTracer, Tracer};

/// Per-operation logging options for [`PerformanceLogger::observe`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub log_input: bool,
    pub log_output: bool,
    pub title: Option<String>,
    pub log_type: String,
    /// Defaults to the operation name
    pub action_type: Option<String>,
}

impl LogOptions {
    /// Options for operations that belong to `module`
    pub fn for_module(module: impl Into<String>) -> Self {
        Self {
            log_type: module.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    pub fn without_input(mut self) -> Self {
        self.log_input = false;
        self
    }

    pub fn without_output(mut self) -> Self {
        self.log_output = false;
        self
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            log_input: true,
            log_output: true,
            title: None,
            log_type: "service".to_string(),
            action_type: None,
        }
    }
}

/// Times operations and queues the slow ones
#[derive(Clone)]
pub struct PerformanceLogger {
    queue: Arc<BoundedLogQueue>,
    tracer: Arc<dyn Tracer>,
    threshold_ms: i64,
}

impl PerformanceLogger {
    pub fn new(queue: Arc<BoundedLogQueue>, threshold_ms: i64) -> Self {
        Self {
            queue,
            tracer: Arc::new(DefaultTracer),
            threshold_ms,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn queue(&self) -> &Arc<BoundedLogQueue> {
        &self.queue
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }

    /// At or above the threshold
    pub fn should_record(&self, duration_ms: i64) -> bool {
        duration_ms >= self.threshold_ms
    }

    /// Queue `record` if it is slow enough. Returns whether it was queued.
    pub fn submit(&self, record: LogRecord) -> bool {
        if !self.should_record(record.duration_ms()) {
            return false;
        }
        self.queue.enqueue(record)
    }

    /// Run `operation`, queueing a record when it exceeds the threshold.
    ///
    /// The operation's result is returned unchanged. A [`BusinessError`]
    /// still counts as success.
    pub async fn observe<A, T, E, F>(
        &self,
        name: &str,
        options: &LogOptions,
        context: Option<ContextHandle>,
        args: &A,
        operation: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize,
        E: Display + 'static,
        F: Future<Output = Result<T, E>>,
    {
        let span = self.tracer.next_span(name, None);
        let start_time = chrono::Utc::now().timestamp_millis();

        let result = operation.await;

        let end_time = chrono::Utc::now().timestamp_millis();
        if !self.should_record(end_time - start_time) {
            return result;
        }

        let mut record = LogRecord::new(name, start_time, end_time);
        record.trace_id = Some(span.trace_id().to_string());
        record.log_type = options.log_type.clone();
        record.action_type = options
            .action_type
            .clone()
            .unwrap_or_else(|| name.to_string());
        record.title = options.title.clone();
        record.request_id = context.as_ref().and_then(|c| c.lock().request_id.clone());
        record.context = context;

        if options.log_input {
            record.inputs = Some(Payload::from_serialize(args));
        }
        match &result {
            Ok(value) => {
                if options.log_output {
                    record.output = Some(Payload::from_serialize(value));
                }
            }
            Err(e) => {
                record.result = classify_error(e);
                record.output = Some(Payload::Text(e.to_string()));
            }
        }

        span.finish();
        self.queue.enqueue(record);
        result
    }
}

fn classify_error<E: 'static>(error: &E) -> ResultCode {
    let any: &dyn Any = error;
    if any.downcast_ref::<BusinessError>().is_some() {
        ResultCode::Success
    } else {
        ResultCode::Failure
    }
}

impl std::fmt::Debug for PerformanceLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceLogger")
            .field("threshold_ms", &self.threshold_ms)
            .field("queue", &self.queue)
            .finish()
    }
}
