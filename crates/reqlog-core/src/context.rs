//! Per-exchange request context
//!
//! One [`RequestContext`] exists per in-flight request. The HTTP layer
//! creates it on entry, the body tees fill it in, and log records keep a
//! [`ContextHandle`] so the flush loop can read whatever was captured by the
//! time it runs.

use parking_lot::{Mutex, MutexGuard};
use std::borrow::Cow;
use std::sync::Arc;

use crate::config::HttpLogConfig;
use crate::multimap::MultiValueMap;
use crate::record::Payload;
use crate::truncate::{to_json_string, truncate, EMPTY_FIELD};

/// Placeholder stored when the response body exceeds the capture cap
pub const RESPONSE_TOO_LONG: &str = "response too long to log";

/// Everything about one request/response that logging needs later
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub read_request_enabled: bool,
    pub read_response_enabled: bool,
    pub method: String,
    pub path: String,
    pub host: Option<String>,
    pub client_ip: Option<String>,
    /// Caller supplied `Request-Id` header
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub request_headers: MultiValueMap,
    pub query_params: MultiValueMap,
    pub form_data: MultiValueMap,
    /// Query params plus form fields
    pub all_request_data: MultiValueMap,
    /// Raw JSON body, CR/LF stripped
    pub request_body: Option<String>,
    pub status: Option<u16>,
    /// Gateway entry time (ms since epoch)
    pub start_time: i64,
    response_bytes: Vec<u8>,
    response_too_long: bool,
    response_seen: bool,
}

impl RequestContext {
    pub fn new(read_request_enabled: bool, read_response_enabled: bool) -> Self {
        Self {
            read_request_enabled,
            read_response_enabled,
            method: String::new(),
            path: String::new(),
            host: None,
            client_ip: None,
            request_id: None,
            content_type: None,
            content_length: None,
            request_headers: MultiValueMap::new(),
            query_params: MultiValueMap::new(),
            form_data: MultiValueMap::new(),
            all_request_data: MultiValueMap::new(),
            request_body: None,
            status: None,
            start_time: chrono::Utc::now().timestamp_millis(),
            response_bytes: Vec::new(),
            response_too_long: false,
            response_seen: false,
        }
    }

    /// Build a context with toggles taken from configuration
    pub fn from_config(config: &HttpLogConfig) -> Self {
        Self::new(config.request.enable, config.response.enable)
    }

    /// Record one outgoing response chunk.
    ///
    /// Copies at most `max_size` bytes in total; past that the body is
    /// replaced by [`RESPONSE_TOO_LONG`] and further chunks are ignored.
    pub fn append_response_chunk(&mut self, chunk: &[u8], max_size: usize) {
        self.response_seen = true;
        if self.response_too_long {
            return;
        }
        if self.response_bytes.len() + chunk.len() > max_size {
            self.response_too_long = true;
            self.response_bytes = Vec::new();
            return;
        }
        self.response_bytes.extend_from_slice(chunk);
    }

    /// Captured response body, `None` if nothing passed through
    pub fn response_body(&self) -> Option<Cow<'_, str>> {
        if !self.response_seen {
            return None;
        }
        if self.response_too_long {
            return Some(Cow::Borrowed(RESPONSE_TOO_LONG));
        }
        Some(String::from_utf8_lossy(&self.response_bytes))
    }

    /// Request data as a log payload: JSON body if captured, else form data
    pub fn request_payload(&self) -> Option<Payload> {
        if let Some(body) = &self.request_body {
            return Some(Payload::from_text(body));
        }
        if !self.form_data.is_empty() {
            return Some(Payload::from_serialize(&self.form_data));
        }
        None
    }

    /// Response data as a log payload
    pub fn response_payload(&self) -> Option<Payload> {
        if self.response_too_long {
            return Some(Payload::Text(RESPONSE_TOO_LONG.to_string()));
        }
        self.response_body().map(|b| Payload::from_text(&b))
    }

    /// Path without the leading slash, used as the service name
    pub fn service_name(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }

    /// Render the `" | "`-joined request/response summary line
    pub fn summary_line(&self, config: &HttpLogConfig) -> String {
        let mut parts: Vec<String> = Vec::new();

        parts.push(self.service_name().to_string());
        parts.push(self.method.clone());
        parts.push(field(self.client_ip.as_deref()));
        parts.push(field(self.host.as_deref()));

        let headers = self
            .request_headers
            .groups()
            .map(|(name, values)| {
                if config.is_hidden_header(name) {
                    format!("{{{}:[REDACTED]}}", name)
                } else {
                    format!("{{{}:[{}]}}", name, values.join(", "))
                }
            })
            .collect::<String>();
        if !headers.is_empty() {
            parts.push(headers);
        }

        if self.read_request_enabled {
            if self.query_params.is_empty() {
                parts.push(EMPTY_FIELD.to_string());
            } else {
                parts.push(self.query_params.to_log_string());
            }

            let body = if let Some(body) = &self.request_body {
                truncate(body, config.request_body_max).to_string()
            } else if !self.form_data.is_empty() {
                let rendered = self
                    .form_data
                    .groups()
                    .map(|(k, vs)| {
                        let values: String = vs
                            .iter()
                            .map(|v| format!("{},", truncate(v, config.request_body_max)))
                            .collect();
                        format!("{}:{}", k, values)
                    })
                    .collect::<String>();
                truncate(&rendered, config.max_bytes).to_string()
            } else {
                EMPTY_FIELD.to_string()
            };
            parts.push(body);
        }

        parts.push(
            self.status
                .map(|s| s.to_string())
                .unwrap_or_else(|| EMPTY_FIELD.to_string()),
        );

        if self.read_response_enabled {
            let body = match self.response_body() {
                Some(body) => truncate(&to_json_string(&*body), config.max_bytes).to_string(),
                None => EMPTY_FIELD.to_string(),
            };
            parts.push(body);
        }

        parts.join(" | ")
    }
}

fn field(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or(EMPTY_FIELD)
        .to_string()
}

/// Shared handle to a [`RequestContext`]
#[derive(Debug, Clone)]
pub struct ContextHandle(Arc<Mutex<RequestContext>>);

impl ContextHandle {
    pub fn new(context: RequestContext) -> Self {
        Self(Arc::new(Mutex::new(context)))
    }

    pub fn lock(&self) -> MutexGuard<'_, RequestContext> {
        self.0.lock()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RequestContext {
        self.0.lock().clone()
    }
}
