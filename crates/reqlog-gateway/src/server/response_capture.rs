//! Response body capture
//!
//! [`TeeBody`] forwards every frame of the response body unchanged and copies
//! data frames into the request context on the way out.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::task::{Context, Poll};

use reqlog_core::ContextHandle;

use super::context_middleware::{content_type_essence, lookup};
use super::state::PipelineState;

/// Response media types whose bodies are captured
pub const LOGGABLE_CONTENT_TYPES: &[&str] = &[
    "text/xml",
    "application/xml",
    "application/json",
    "text/plain",
    "multipart/form-data",
];

pub fn is_loggable(headers: &HeaderMap) -> bool {
    content_type_essence(headers)
        .map(|essence| LOGGABLE_CONTENT_TYPES.contains(&essence.as_str()))
        .unwrap_or(false)
}

/// Body wrapper that copies data frames into a [`ContextHandle`]
pub struct TeeBody {
    inner: Body,
    ctx: ContextHandle,
    max_size: usize,
}

impl TeeBody {
    pub fn new(inner: Body, ctx: ContextHandle, max_size: usize) -> Self {
        Self {
            inner,
            ctx,
            max_size,
        }
    }
}

impl HttpBody for TeeBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.as_mut().get_mut();

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(Some(Ok(frame))) => {
                if let Some(data) = frame.data_ref() {
                    this.ctx.lock().append_response_chunk(data, this.max_size);
                }
                Poll::Ready(Some(Ok(frame)))
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Wrap `response` so its body is teed into `ctx`
pub fn tee_response(response: Response, ctx: ContextHandle, max_size: usize) -> Response {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(TeeBody::new(body, ctx, max_size)))
}

/// Response capture middleware
pub async fn response_capture_middleware(
    State(state): State<PipelineState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ctx) = lookup(&request) else {
        return next.run(request).await;
    };

    let response = next.run(request).await;

    let read_response = {
        let mut guard = ctx.lock();
        guard.status = Some(response.status().as_u16());
        guard.read_response_enabled
    };
    if !read_response || !is_loggable(response.headers()) {
        return response;
    }

    tee_response(response, ctx, state.config.response_body_max)
}
