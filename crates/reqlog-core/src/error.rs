//! Error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid boolean for {key}: {value}")]
    InvalidBool { key: &'static str, value: String },
    #[error("Invalid number for {key}: {value}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("Queue capacity must be greater than zero")]
    ZeroCapacity,
    #[error("Flush period must be greater than zero")]
    ZeroFlushPeriod,
}

/// A log line could not be written
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,
    #[error("Sink write failed: {0}")]
    Write(String),
}

/// Failure while turning one record into log lines
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("Failed to serialize log field: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Application error that is part of normal business flow.
///
/// Records that fail with this error are still reported with a success
/// result code.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct BusinessError {
    pub code: String,
    pub message: String,
}

impl BusinessError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
