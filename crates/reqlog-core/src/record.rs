//! Log records and their serialized line form

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::context::ContextHandle;
use crate::truncate::{to_bounded_json, truncate, SERIALIZE_FAILED};

/// Captured input or output value
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    /// Conversion failed at capture time
    Unserializable,
}

impl Payload {
    /// Parse `text` as JSON, keeping it as plain text if it is not
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(text.to_string()),
        }
    }

    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Payload::Json(value),
            Err(e) => {
                tracing::error!("Failed to capture log payload: {}", e);
                Payload::Unserializable
            }
        }
    }

    /// Render for a log line, capped at `max_bytes`
    pub fn render(&self, max_bytes: usize) -> String {
        match self {
            Payload::Json(value) => to_bounded_json(value, max_bytes),
            Payload::Text(text) => truncate(text, max_bytes).to_string(),
            Payload::Unserializable => SERIALIZE_FAILED.to_string(),
        }
    }
}

/// Outcome of the observed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Failure,
}

impl ResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Success => "0",
            ResultCode::Failure => "1",
        }
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One timed operation waiting in the queue
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub trace_id: Option<String>,
    pub request_id: Option<String>,
    /// Route or method name
    pub service: String,
    pub start_time: i64,
    pub end_time: i64,
    pub log_type: String,
    pub action_type: String,
    pub result: ResultCode,
    pub inputs: Option<Payload>,
    pub output: Option<Payload>,
    pub title: Option<String>,
    pub context: Option<ContextHandle>,
}

impl LogRecord {
    pub fn new(service: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        let service = service.into();
        Self {
            trace_id: None,
            request_id: None,
            action_type: service.clone(),
            service,
            start_time,
            end_time,
            log_type: "http".to_string(),
            result: ResultCode::Success,
            inputs: None,
            output: None,
            title: None,
            context: None,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// Serialized form of one perf log line
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogField {
    pub trace_id: String,
    pub request_id: Option<String>,
    pub service: String,
    pub duration: i64,
    pub log_type: String,
    pub action_type: String,
    pub start_time: i64,
    pub end_time: i64,
    pub client_address: Option<String>,
    pub title: Option<String>,
    pub inputs: Option<String>,
    pub response: Option<String>,
    pub result: ResultCode,
}

impl LogField {
    /// Build the line for `record`, reading whatever its context captured.
    ///
    /// Record-level inputs/outputs win over the context's request and
    /// response bodies.
    pub fn from_record(record: &LogRecord, max_bytes: usize) -> Self {
        let context = record.context.as_ref().map(|c| c.snapshot());

        let request_id = record
            .request_id
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.request_id.clone()));
        let client_address = context.as_ref().and_then(|c| c.client_ip.clone());

        let inputs = record
            .inputs
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.request_payload()))
            .map(|p| p.render(max_bytes));
        let response = record
            .output
            .clone()
            .or_else(|| context.as_ref().and_then(|c| c.response_payload()))
            .map(|p| p.render(max_bytes));

        Self {
            trace_id: record.trace_id.clone().unwrap_or_default(),
            request_id,
            service: record.service.clone(),
            duration: record.duration_ms(),
            log_type: record.log_type.clone(),
            action_type: record.action_type.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            client_address,
            title: record.title.clone(),
            inputs,
            response,
            result: record.result,
        }
    }
}
