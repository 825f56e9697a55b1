//! Scheduled drain of the log queue
//!
//! A single task drains whatever is queued, writes one perf line per record
//! and, when the record carries a request context, a request/response summary
//! line. Ticks use fixed-delay semantics: the next sleep starts after the
//! previous batch is done.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::HttpLogConfig;
use crate::error::FlushError;
use crate::queue::BoundedLogQueue;
use crate::record::{LogField, LogRecord};
use crate::sink::{LogSink, TracingSink};

/// Outcome of one flush tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub drained: usize,
    pub written: usize,
    pub failed: usize,
}

pub struct LogFlusher {
    queue: Arc<BoundedLogQueue>,
    perf_sink: Arc<dyn LogSink>,
    req_res_sink: Arc<dyn LogSink>,
    config: HttpLogConfig,
}

impl LogFlusher {
    /// Flusher writing to the `perf_logger` / `req_res_logger` targets
    pub fn new(queue: Arc<BoundedLogQueue>, config: HttpLogConfig) -> Self {
        Self::with_sinks(
            queue,
            config,
            Arc::new(TracingSink::Perf),
            Arc::new(TracingSink::ReqRes),
        )
    }

    pub fn with_sinks(
        queue: Arc<BoundedLogQueue>,
        config: HttpLogConfig,
        perf_sink: Arc<dyn LogSink>,
        req_res_sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            queue,
            perf_sink,
            req_res_sink,
            config,
        }
    }

    pub fn period(&self) -> Duration {
        self.config.flush.period()
    }

    /// Drain and write one batch
    pub fn flush_once(&self) -> FlushReport {
        let batch = self.queue.drain(self.queue.capacity());
        let mut report = FlushReport {
            drained: batch.len(),
            ..FlushReport::default()
        };

        for record in &batch {
            match self.write_record(record) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(service = %record.service, "Failed to flush log record: {}", e);
                }
            }
        }

        let stats = self.queue.stats();
        self.queue.reset_counters();

        if report.drained > 0 || stats.dropped > 0 {
            debug!(
                drained = report.drained,
                written = report.written,
                failed = report.failed,
                success = stats.success,
                dropped = stats.dropped,
                remaining = stats.len,
                "Log queue flushed"
            );
        }
        report
    }

    fn write_record(&self, record: &LogRecord) -> Result<(), FlushError> {
        let field = LogField::from_record(record, self.config.max_bytes);
        let line = serde_json::to_string(&field)?;
        self.perf_sink.write_line(&line)?;

        if let Some(context) = &record.context {
            let summary = context.lock().summary_line(&self.config);
            self.req_res_sink.write_line(&summary)?;
        }
        Ok(())
    }

    /// Spawn the flush loop.
    ///
    /// Cancelling `shutdown` stops the loop after one last flush.
    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.period();
            info!("Log flusher started (period {}ms)", period.as_millis());

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(period) => {
                        self.flush_once();
                    }
                }
            }

            let report = self.flush_once();
            info!(
                "Log flusher stopped ({} records written on shutdown)",
                report.written
            );
        })
    }
}

impl std::fmt::Debug for LogFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFlusher")
            .field("queue", &self.queue)
            .field("period", &self.period())
            .finish()
    }
}
