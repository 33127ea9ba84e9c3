//! Tracing subscriber setup
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, falling back to the configured level)
//!   └── Fmt Layer (stderr, pretty or JSON)
//! ```
//!
//! Logs go to stderr so that machine-readable output on stdout stays clean.

use crate::config::{is_valid_log_level, LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Logging errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),

    #[error("Invalid log level '{0}': must be 'trace', 'debug', 'info', 'warn', or 'error'")]
    InvalidLevel(String),
}

/// Initialize the global tracing subscriber
///
/// `level_override` (from the command line) takes precedence over the
/// configured level; `RUST_LOG` takes precedence over both.
pub fn init_subscriber(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<(), LoggingError> {
    let level = level_override.unwrap_or(config.level.as_str());
    if !is_valid_log_level(level) {
        return Err(LoggingError::InvalidLevel(level.to_string()));
    }
    let level = level.to_lowercase();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let result = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr);
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr);
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
