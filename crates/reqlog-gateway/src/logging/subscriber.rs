//! tracing-subscriber setup
//!
//! Console plus three daily-rotated files: the application log and one file
//! for each dedicated logging target.

use std::path::Path;
use thiserror::Error;
use tracing::Metadata;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{filter_fn, EnvFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer,
};

use reqlog_core::sink::{PERF_TARGET, REQ_RES_TARGET};

/// Default filter when RUST_LOG is not set
pub const DEFAULT_FILTER: &str = "info,reqlog_core=debug,reqlog_gateway=debug";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log file appender: {0}")]
    Appender(#[from] tracing_appender::rolling::InitError),
    #[error("Invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

fn is_dedicated(metadata: &Metadata<'_>) -> bool {
    let target = metadata.target();
    target == PERF_TARGET || target == REQ_RES_TARGET
}

fn daily(logs_dir: &Path, prefix: &str) -> Result<RollingFileAppender, LoggingError> {
    Ok(RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(logs_dir)?)
}

fn env_filter() -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(DEFAULT_FILTER)?),
    }
}

/// Install the global subscriber.
///
/// The returned guards flush the non-blocking writers on drop and must be
/// held for the lifetime of the program.
pub fn init_tracing(logs_dir: &Path) -> Result<Vec<WorkerGuard>, LoggingError> {
    if let Err(e) = std::fs::create_dir_all(logs_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
    }

    // Creates files like: reqlog.2026-01-22.log
    let (app_writer, app_guard) = tracing_appender::non_blocking(daily(logs_dir, "reqlog")?);
    let (perf_writer, perf_guard) = tracing_appender::non_blocking(daily(logs_dir, "perf")?);
    let (req_res_writer, req_res_guard) =
        tracing_appender::non_blocking(daily(logs_dir, "req-res")?);

    // Console layer: colored, compact
    let console_layer = fmt::layer()
        .with_ansi(true)
        .compact()
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .with_filter(env_filter()?)
        .with_filter(filter_fn(|m| !is_dedicated(m)));

    // File layer: no colors, include more detail
    let file_layer = fmt::layer()
        .with_writer(app_writer)
        .with_ansi(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_filter(env_filter()?)
        .with_filter(filter_fn(|m| !is_dedicated(m)));

    // Dedicated targets: bare lines, one record per line
    let perf_layer = fmt::layer()
        .with_writer(perf_writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_filter(filter_fn(|m| m.target() == PERF_TARGET));

    let req_res_layer = fmt::layer()
        .with_writer(req_res_writer)
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_filter(filter_fn(|m| m.target() == REQ_RES_TARGET));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(perf_layer)
        .with(req_res_layer)
        .try_init()?;

    Ok(vec![app_guard, perf_guard, req_res_guard])
}
