//! Shared test utilities and fixtures for reqlog integration tests.

pub use reqlog_core::{
    BoundedLogQueue, ContextHandle, HttpLogConfig, LogRecord, MemorySink, RequestContext,
    ResultCode,
};
pub use reqlog_gateway::PipelineState;

/// Pipeline fixtures
pub mod fixtures {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    /// Pipeline wired to in-memory sinks
    pub struct TestPipeline {
        pub state: PipelineState,
        pub perf_sink: Arc<MemorySink>,
        pub req_res_sink: Arc<MemorySink>,
    }

    impl TestPipeline {
        pub fn new(config: HttpLogConfig) -> Self {
            let perf_sink = Arc::new(MemorySink::new());
            let req_res_sink = Arc::new(MemorySink::new());
            let state = PipelineState::with_sinks(config, perf_sink.clone(), req_res_sink.clone());
            Self {
                state,
                perf_sink,
                req_res_sink,
            }
        }

        /// Wrap `routes` with the logging chain
        pub fn app(&self, routes: Router) -> Router {
            self.state.layer(routes)
        }

        /// Perf lines written so far, parsed as JSON
        pub fn perf_lines(&self) -> Vec<serde_json::Value> {
            self.perf_sink
                .lines()
                .iter()
                .map(|l| serde_json::from_str(l).expect("perf line is JSON"))
                .collect()
        }
    }

    /// Config with a threshold that lets every request through
    pub fn record_everything() -> HttpLogConfig {
        let mut config = HttpLogConfig::default();
        config.perf.threshold_ms = -1;
        config
    }

    pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    pub fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("content-length", body.len())
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    pub async fn body_text(body: Body) -> String {
        let bytes = body.collect().await.expect("body").to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn record(service: &str, duration_ms: i64) -> LogRecord {
        LogRecord::new(service, 1_000, 1_000 + duration_ms)
    }
}
