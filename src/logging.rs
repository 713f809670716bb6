//! Logging setup: daily-rotated text and JSON files plus a compact stdout layer.
//!
//! Log files are written to `<output_dir>/logs/`:
//! - `crawler.log` - human-readable text, no ANSI colors
//! - `crawler.json.log` - structured JSON for later analysis

use std::path::Path;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Logging already initialized: {0}")]
    Init(String),
}

/// Keeps the background writers flushing. Drop it only at exit.
#[must_use = "log files stop receiving events once the guard is dropped"]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` controls filtering and falls back to `info`, for example
/// `RUST_LOG=modelcard_crawler=debug,reqwest=warn`.
pub fn init_logging<P: AsRef<Path>>(log_dir: P) -> Result<LogGuard, LoggingError> {
    let log_path = log_dir.as_ref();
    std::fs::create_dir_all(log_path)?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let (text_writer, text_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(log_path, "crawler.log"));
    let (json_writer, json_guard) = tracing_appender::non_blocking(
        tracing_appender::rolling::daily(log_path, "crawler.json.log"),
    );

    let text_layer = fmt::layer()
        .with_writer(text_writer)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .compact()
        .with_filter(env_filter.clone());

    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_target(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(env_filter.clone());

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!("Logs: {}", log_path.display());

    Ok(LogGuard {
        _guards: vec![text_guard, json_guard],
    })
}

/// Log to `<output_dir>/logs`.
pub fn init_logging_in_dir<P: AsRef<Path>>(output_dir: P) -> Result<LogGuard, LoggingError> {
    init_logging(output_dir.as_ref().join("logs"))
}
