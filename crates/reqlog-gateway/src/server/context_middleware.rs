//! Request Context Capture Middleware
//!
//! Outermost layer of the logging chain. Attaches a [`ContextHandle`] to the
//! request, copies headers and query params into it and tees JSON or
//! form-urlencoded bodies so the handler still receives an equivalent body.

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use std::net::SocketAddr;
use tracing::{warn, Instrument};

use reqlog_core::truncate::strip_line_breaks;
use reqlog_core::{ContextHandle, HttpLogConfig, MultiValueMap, RequestContext};

use super::client_ip::resolve_client_ip;
use super::state::PipelineState;
use crate::logging::{RequestSpan, TraceContext};

/// Request body kinds that are captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

/// Media type without parameters, lowercased
pub fn content_type_essence(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// `charset` parameter of the content type, if present
pub fn content_type_charset(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

fn is_utf8_charset(charset: Option<&str>) -> bool {
    matches!(charset, None | Some("utf-8") | Some("utf8"))
}

/// True when every percent-decoded byte sequence in `input` is valid UTF-8
fn decodes_as_utf8(input: &[u8]) -> bool {
    std::str::from_utf8(&urlencoding::decode_binary(input)).is_ok()
}

fn body_kind(essence: &str) -> Option<BodyKind> {
    if essence == "application/json" || essence.ends_with("+json") {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

/// Parse `a=1&b=2` into an ordered multimap
pub fn parse_urlencoded(input: &[u8]) -> MultiValueMap {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Serialize an ordered multimap back to `key=value&key=value`
pub fn encode_urlencoded(map: &MultiValueMap) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Create a context for `request` and store it in the request extensions.
///
/// Returns `None` without attaching anything when the path is excluded or
/// both capture toggles are off. A second call replaces the first context.
pub fn attach(request: &mut Request, config: &HttpLogConfig) -> Option<ContextHandle> {
    let path = request.uri().path().to_string();
    if config.is_excluded(&path) || !config.capture_enabled() {
        return None;
    }

    let headers = request.headers();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut ctx = RequestContext::from_config(config);
    ctx.method = request.method().to_string();
    ctx.path = path;
    ctx.host = header_string(headers, header::HOST.as_str())
        .or_else(|| request.uri().host().map(str::to_string));
    ctx.client_ip = resolve_client_ip(headers, peer);
    ctx.request_id = header_string(headers, "request-id");
    ctx.content_type = content_type_essence(headers);
    ctx.content_length = content_length(headers);

    for (name, value) in headers {
        ctx.request_headers
            .add(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
    }
    if let Some(query) = request.uri().query() {
        ctx.query_params = parse_urlencoded(query.as_bytes());
        ctx.all_request_data.add_all(&ctx.query_params);
    }

    let handle = ContextHandle::new(ctx);
    request.extensions_mut().insert(handle.clone());
    Some(handle)
}

/// Context attached by [`attach`], if any
pub fn lookup(request: &Request) -> Option<ContextHandle> {
    request.extensions().get::<ContextHandle>().cloned()
}

/// Copy the request body into the context and rebuild the request.
///
/// Anything that is not a non-empty JSON or form body within the buffering
/// cap is returned untouched.
pub async fn capture_request_body(
    request: Request,
    ctx: &ContextHandle,
    config: &HttpLogConfig,
) -> Request {
    let Some(kind) = content_type_essence(request.headers()).and_then(|e| body_kind(&e)) else {
        return request;
    };
    match content_length(request.headers()) {
        Some(len) if len > 0 && len <= config.max_buffered_body as u64 => {}
        _ => return request,
    }

    let charset = content_type_charset(request.headers());
    let (mut parts, body) = request.into_parts();
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            // The handler sees the same read error, without a stale length
            parts.headers.remove(header::CONTENT_LENGTH);
            let failed = futures::stream::once(async move { Err::<Bytes, _>(e) });
            return Request::from_parts(parts, Body::from_stream(failed));
        }
    };

    match kind {
        BodyKind::Json => {
            let text = String::from_utf8_lossy(&bytes);
            ctx.lock().request_body = Some(strip_line_breaks(&text));
            Request::from_parts(parts, Body::from(bytes))
        }
        BodyKind::Form => {
            let form = parse_urlencoded(&bytes);
            if form.is_empty() {
                return Request::from_parts(parts, Body::from(bytes));
            }

            let reencode = is_utf8_charset(charset.as_deref()) && decodes_as_utf8(&bytes);
            let encoded = reencode.then(|| encode_urlencoded(&form));
            {
                let mut ctx = ctx.lock();
                ctx.all_request_data.add_all(&form);
                ctx.form_data = form;
            }
            let Some(encoded) = encoded else {
                return Request::from_parts(parts, Body::from(bytes));
            };
            parts
                .headers
                .insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));
            Request::from_parts(parts, Body::from(encoded))
        }
    }
}

/// Context capture middleware
///
/// Runs the rest of the chain inside the request's tracing span.
pub async fn context_capture_middleware(
    State(state): State<PipelineState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(ctx) = attach(&mut request, &state.config) else {
        return next.run(request).await;
    };

    let trace = TraceContext::new(
        request.method().as_str(),
        request.uri().path(),
        request.headers(),
    );
    request.extensions_mut().insert(trace.clone());
    let span = RequestSpan::enter(&trace);

    async move {
        RequestSpan::log_entry(&trace);

        let read_request = ctx.lock().read_request_enabled;
        let request = if read_request {
            capture_request_body(request, &ctx, &state.config).await
        } else {
            request
        };

        let response = next.run(request).await;
        RequestSpan::log_exit(&trace, response.status().as_u16());
        response
    }
    .instrument(span)
    .await
}
