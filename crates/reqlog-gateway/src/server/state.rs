//! Shared state of the logging middleware

use axum::{middleware, Router};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use reqlog_core::{BoundedLogQueue, HttpLogConfig, LogFlusher, LogSink, PerformanceLogger};

use super::context_middleware::context_capture_middleware;
use super::performance_middleware::performance_middleware;
use super::response_capture::response_capture_middleware;

/// Queue, gate and flusher for one process, cheap to clone
#[derive(Clone, Debug)]
pub struct PipelineState {
    pub config: Arc<HttpLogConfig>,
    pub queue: Arc<BoundedLogQueue>,
    pub perf: PerformanceLogger,
    flusher: Arc<LogFlusher>,
}

impl PipelineState {
    /// Pipeline writing to the dedicated tracing targets
    pub fn new(config: HttpLogConfig) -> Self {
        let queue = Arc::new(BoundedLogQueue::new(config.queue.capacity));
        let flusher = Arc::new(LogFlusher::new(queue.clone(), config.clone()));
        Self::assemble(config, queue, flusher)
    }

    pub fn with_sinks(
        config: HttpLogConfig,
        perf_sink: Arc<dyn LogSink>,
        req_res_sink: Arc<dyn LogSink>,
    ) -> Self {
        let queue = Arc::new(BoundedLogQueue::new(config.queue.capacity));
        let flusher = Arc::new(LogFlusher::with_sinks(
            queue.clone(),
            config.clone(),
            perf_sink,
            req_res_sink,
        ));
        Self::assemble(config, queue, flusher)
    }

    fn assemble(config: HttpLogConfig, queue: Arc<BoundedLogQueue>, flusher: Arc<LogFlusher>) -> Self {
        let perf = PerformanceLogger::new(queue.clone(), config.perf.threshold_ms);
        Self {
            config: Arc::new(config),
            queue,
            perf,
            flusher,
        }
    }

    pub fn flusher(&self) -> &Arc<LogFlusher> {
        &self.flusher
    }

    /// Spawn the flush loop, stopped by `shutdown`
    pub fn start_flusher(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.flusher.clone().start(shutdown)
    }

    /// Wrap `router` with the logging chain.
    ///
    /// Context capture is outermost, then response capture, then the
    /// performance filter closest to the routes.
    pub fn layer<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(middleware::from_fn_with_state(
                self.clone(),
                performance_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.clone(),
                response_capture_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.clone(),
                context_capture_middleware,
            ))
    }
}
