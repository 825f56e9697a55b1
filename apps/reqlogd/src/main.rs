//! reqlogd - demo service behind the request logging pipeline

mod routes;

use std::path::PathBuf;
use tracing::info;

use reqlog_core::HttpLogConfig;
use reqlog_gateway::{init_tracing, GatewayConfig, GatewayServer, PipelineState};

fn logs_dir() -> PathBuf {
    std::env::var("REQLOG_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (for development)
    dotenvy::dotenv().ok();

    // Guards must be kept alive for the duration of the program
    let _guards = init_tracing(&logs_dir())?;

    let log_config = HttpLogConfig::from_env()?;
    let gateway_config = GatewayConfig::from_env()?;
    info!("reqlogd {} starting", env!("CARGO_PKG_VERSION"));

    let pipeline = PipelineState::new(log_config);
    let routes = routes::router(pipeline.perf.clone());

    GatewayServer::with_pipeline(gateway_config, pipeline, routes)
        .run()
        .await
}
