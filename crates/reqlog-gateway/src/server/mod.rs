//! Gateway Server
//!
//! Hosts application routes behind the request logging chain and owns the
//! lifecycle of the flush loop.

pub mod client_ip;
pub mod context_middleware;
pub mod performance_middleware;
pub mod response_capture;
mod state;

pub use state::PipelineState;

use anyhow::Context as _;
use axum::Router;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use reqlog_core::{ConfigError, HttpLogConfig};

/// Default port when `REQLOG_PORT` is not set
pub const DEFAULT_PORT: u16 = 8080;

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS for browser access
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            enable_cors: true,
        }
    }
}

impl GatewayConfig {
    /// Overlay `REQLOG_HOST` / `REQLOG_PORT` on the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("REQLOG_HOST") {
            if !host.trim().is_empty() {
                config.host = host.trim().to_string();
            }
        }
        if let Ok(port) = std::env::var("REQLOG_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: "REQLOG_PORT",
                value: port.clone(),
            })?;
        }
        Ok(config)
    }

    /// Get the socket address
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid address {}:{}", self.host, self.port))
    }
}

/// Resolves on Ctrl+C, SIGTERM or when `token` is cancelled
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("[Gateway] Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("[Gateway] Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("[Gateway] Received Ctrl+C"),
        _ = terminate => info!("[Gateway] Received SIGTERM"),
        _ = token.cancelled() => info!("[Gateway] Shutdown requested"),
    }
}

/// HTTP server with the request logging chain in front of `routes`
pub struct GatewayServer {
    config: GatewayConfig,
    pipeline: PipelineState,
    routes: Router,
    shutdown: CancellationToken,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, log_config: HttpLogConfig, routes: Router) -> Self {
        Self::with_pipeline(config, PipelineState::new(log_config), routes)
    }

    pub fn with_pipeline(config: GatewayConfig, pipeline: PipelineState, routes: Router) -> Self {
        info!(
            "[Gateway] Logging pipeline: queue capacity {}, flush every {}ms, threshold {}ms",
            pipeline.config.queue.capacity,
            pipeline.config.flush.period_ms,
            pipeline.config.perf.threshold_ms
        );
        Self {
            config,
            pipeline,
            routes,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn pipeline(&self) -> &PipelineState {
        &self.pipeline
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let mut router = self
            .pipeline
            .layer(self.routes.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Run until a shutdown signal, then flush what is still queued
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.addr()?;

        info!("[Gateway] Starting on {}", addr);
        info!(
            "[Gateway] CORS: {}",
            if self.config.enable_cors {
                "enabled"
            } else {
                "disabled"
            }
        );

        let flusher_token = CancellationToken::new();
        let flusher = self.pipeline.start_flusher(flusher_token.clone());

        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("[Gateway] Ready to accept connections");

        let served = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal(self.shutdown.clone()))
        .await;

        flusher_token.cancel();
        if let Err(e) = flusher.await {
            warn!("[Gateway] Log flusher task failed: {}", e);
        }
        info!("[Gateway] Stopped");

        served.context("Server error")
    }

    /// Start the server in the background
    ///
    /// Returns a JoinHandle that can be used to wait for completion or abort.
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
