//! Logging pipeline configuration
//!
//! All knobs have production defaults; `from_env` overlays `REQLOG_*`
//! environment variables on top of them.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::ConfigError;

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;
/// Default flush period in milliseconds
pub const DEFAULT_FLUSH_PERIOD_MS: u64 = 3000;
/// Default significance threshold in milliseconds
pub const DEFAULT_THRESHOLD_MS: i64 = 50;
/// Generic truncation cap for inputs/outputs
pub const DEFAULT_MAX_BYTES: usize = 4096;
/// Request body cap for the summary line
pub const DEFAULT_REQUEST_BODY_MAX: usize = 1000;
/// Response body capture cap
pub const DEFAULT_RESPONSE_BODY_MAX: usize = 1000;
/// Largest request body that will be buffered for capture
pub const DEFAULT_MAX_BUFFERED_BODY: usize = 10 * 1024 * 1024;

/// Toggle for one side of the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureToggle {
    pub enable: bool,
}

impl Default for CaptureToggle {
    fn default() -> Self {
        Self { enable: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    /// Executions shorter than this duration are never recorded
    pub threshold_ms: i64,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            threshold_ms: DEFAULT_THRESHOLD_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    pub period_ms: u64,
}

impl FlushConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_FLUSH_PERIOD_MS,
        }
    }
}

/// HTTP logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLogConfig {
    pub request: CaptureToggle,
    pub response: CaptureToggle,
    /// Header names rendered as `[REDACTED]` (matched case-insensitively)
    pub hidden_headers: Vec<String>,
    /// Paths that bypass capture and timing entirely
    pub excluded_endpoints: Vec<String>,
    pub request_body_max: usize,
    pub response_body_max: usize,
    pub max_bytes: usize,
    pub max_buffered_body: usize,
    pub perf: PerfConfig,
    pub queue: QueueConfig,
    pub flush: FlushConfig,
}

impl Default for HttpLogConfig {
    fn default() -> Self {
        Self {
            request: CaptureToggle::default(),
            response: CaptureToggle::default(),
            hidden_headers: ["authorization", "proxy-authorization", "cookie", "set-cookie", "x-api-key"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_endpoints: vec!["/actuator/health".to_string(), "/health".to_string()],
            request_body_max: DEFAULT_REQUEST_BODY_MAX,
            response_body_max: DEFAULT_RESPONSE_BODY_MAX,
            max_bytes: DEFAULT_MAX_BYTES,
            max_buffered_body: DEFAULT_MAX_BUFFERED_BODY,
            perf: PerfConfig::default(),
            queue: QueueConfig::default(),
            flush: FlushConfig::default(),
        }
    }
}

impl HttpLogConfig {
    /// Load from `REQLOG_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = read_bool("REQLOG_REQUEST_ENABLE")? {
            config.request.enable = v;
        }
        if let Some(v) = read_bool("REQLOG_RESPONSE_ENABLE")? {
            config.response.enable = v;
        }
        if let Some(v) = read_list("REQLOG_HIDDEN_HEADERS") {
            config.hidden_headers = v;
        }
        if let Some(v) = read_list("REQLOG_EXCLUDED_ENDPOINTS") {
            config.excluded_endpoints = v;
        }
        if let Some(v) = read_number("REQLOG_REQUEST_BODY_MAX")? {
            config.request_body_max = v;
        }
        if let Some(v) = read_number("REQLOG_RESPONSE_BODY_MAX")? {
            config.response_body_max = v;
        }
        if let Some(v) = read_number("REQLOG_MAX_BYTES")? {
            config.max_bytes = v;
        }
        if let Some(v) = read_number("REQLOG_MAX_BUFFERED_BODY")? {
            config.max_buffered_body = v;
        }
        if let Some(v) = read_number("REQLOG_PERF_THRESHOLD_MS")? {
            config.perf.threshold_ms = v;
        }
        if let Some(v) = read_number("REQLOG_QUEUE_CAPACITY")? {
            config.queue.capacity = v;
        }
        if let Some(v) = read_number("REQLOG_FLUSH_PERIOD_MS")? {
            config.flush.period_ms = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.flush.period_ms == 0 {
            return Err(ConfigError::ZeroFlushPeriod);
        }
        Ok(())
    }

    /// Whether `path` bypasses the pipeline
    pub fn is_excluded(&self, path: &str) -> bool {
        self.excluded_endpoints.iter().any(|p| p == path) || path.contains("actuator")
    }

    /// Whether a header should be redacted
    pub fn is_hidden_header(&self, name: &str) -> bool {
        self.hidden_headers.iter().any(|h| h.eq_ignore_ascii_case(name))
    }

    /// Whether any capture is enabled
    pub fn capture_enabled(&self) -> bool {
        self.request.enable || self.response.enable
    }
}

fn read_var(key: &'static str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn read_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match read_var(key) {
        None => Ok(None),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidBool { key, value: v }),
        },
    }
}

fn read_number<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match read_var(key) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: v }),
    }
}

fn read_list(key: &'static str) -> Option<Vec<String>> {
    read_var(key).map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
