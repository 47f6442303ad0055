//! Logging setup shared by the binaries.
//!
//! Stdout carries JSON responses, so logs go to stderr or a file, always
//! through [`SanitizingMakeWriter`].
//!
//! - `ASTRORISK_LOG_MODE`: `file`, `stderr` or `auto` (default). `auto` logs
//!   to a file when `ASTRORISK_LOG_FILE` is set, otherwise to stderr.
//! - `ASTRORISK_LOG_FILE`: log file path (default `astrorisk.log`)
//! - `RUST_LOG`: filter directives (default `info`)

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::sanitize::SanitizingMakeWriter;

const LOG_MODE_ENV: &str = "ASTRORISK_LOG_MODE";
const LOG_FILE_ENV: &str = "ASTRORISK_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "astrorisk.log";

/// Install the global subscriber. Keep the returned guard alive until exit,
/// or buffered log lines are lost.
///
/// # Errors
/// Returns error if the log file cannot be opened.
pub fn init() -> std::io::Result<WorkerGuard> {
    let log_mode = std::env::var(LOG_MODE_ENV).unwrap_or_else(|_| "auto".to_string());
    let log_file = std::env::var(LOG_FILE_ENV).ok();

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        _ => log_file.is_some(),
    };

    let (writer, guard) = if use_file {
        let path = log_file.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        if let Some(parent) = std::path::Path::new(&path).parent() {
            // Best-effort: a missing directory surfaces as an open error below.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}
