//! Tracing subscriber setup
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! With `logging.log_path` set, a daily rolling file receives the same events.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::errors::{AppError, AppResult, ErrorContextExt};

const LOG_FILE_NAME: &str = "engage.log";

/// Directive used when `RUST_LOG` is unset
pub fn effective_level(config: &LoggingConfig, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        &config.level
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Split a configured log path into directory and file name
///
/// A path without an extension is treated as a directory.
pub fn log_file_location(log_path: &str) -> (PathBuf, String) {
    let path = Path::new(log_path);
    match (path.extension(), path.file_name()) {
        (Some(_), Some(name)) => (
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
            name.to_string_lossy().into_owned(),
        ),
        _ => (path.to_path_buf(), LOG_FILE_NAME.to_string()),
    }
}

/// Install the global subscriber; keep the returned guard alive to flush file output
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> AppResult<Option<WorkerGuard>> {
    let level = effective_level(config, verbose);
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    let Some(log_path) = &config.log_path else {
        tracing_subscriber::registry()
            .with(build_filter(level))
            .with(console_layer)
            .try_init()
            .map_err(|e| AppError::LoggingInit { message: e.to_string() })?;
        return Ok(None);
    };

    let (directory, file_name) = log_file_location(log_path);
    std::fs::create_dir_all(&directory)
        .with_context_lazy(|| format!("Failed to create log directory {}", directory.display()))?;

    let file_appender = tracing_appender::rolling::daily(&directory, &file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::LoggingInit { message: e.to_string() })?;

    tracing::debug!("File logging to {:?}/{}", directory, file_name);
    Ok(Some(guard))
}
