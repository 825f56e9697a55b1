//! Destinations for flushed log lines

use parking_lot::Mutex;

use crate::error::SinkError;

/// Target of the performance log lines
pub const PERF_TARGET: &str = "perf_logger";
/// Target of the request/response summary lines
pub const REQ_RES_TARGET: &str = "req_res_logger";

/// Writes complete, single-line log entries
pub trait LogSink: Send + Sync {
    fn write_line(&self, line: &str) -> Result<(), SinkError>;
}

/// Sink backed by a dedicated `tracing` target.
///
/// The subscriber decides where each target ends up (normally its own
/// rotating file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingSink {
    Perf,
    ReqRes,
}

impl LogSink for TracingSink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        match self {
            TracingSink::Perf => tracing::info!(target: PERF_TARGET, "{}", line),
            TracingSink::ReqRes => tracing::info!(target: REQ_RES_TARGET, "{}", line),
        }
        Ok(())
    }
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}
