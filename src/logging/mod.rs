//! Structured logging setup for the link telemetry collector
//!
//! Console output plus daily-rotating JSON log files. The log level is
//! controlled with the `RUST_LOG` environment variable (default: info).

pub mod macros;

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system.
///
/// Creates the log directory and sets up daily rotating log files under
/// the platform data directory (`linkpulse/logs/linkpulse.log.YYYY-MM-DD`).
pub fn init_logging() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "linkpulse.log");

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(log_dir)
}

/// Resolve the platform-specific log directory
fn get_log_directory() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("linkpulse").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_directory_is_under_app_dir() {
        let dir = get_log_directory().expect("log directory");
        assert!(dir.to_str().unwrap().contains("linkpulse"));
    }
}
