//! Configuration module for presign-uploadr
//!
//! Handles loading and parsing of an optional YAML configuration file with
//! support for environment variable expansion and validation. Every section
//! has defaults, so an empty document is a valid configuration.
//!
//! # Example
//!
//! ```yaml
//! upload:
//!   url: "${PRESIGNED_URL}"
//! transport:
//!   chunk_size: 262144
//!   connect_timeout_seconds: 10
//! logging:
//!   level: "debug"
//!   format: "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

const MIN_CHUNK_SIZE: usize = 1024;
const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.upload.url {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "upload.url must not be empty when set".into(),
                ));
            }
        }

        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&self.transport.chunk_size) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid chunk_size {}: must be between {} and {} bytes",
                self.transport.chunk_size, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
            )));
        }

        if self.transport.connect_timeout_seconds == Some(0) {
            return Err(ConfigError::ValidationError(
                "connect_timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.transport.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "user_agent cannot be empty".into(),
            ));
        }

        if !is_valid_log_level(&self.logging.level) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log level '{}': must be 'trace', 'debug', 'info', 'warn', or 'error'",
                self.logging.level
            )));
        }

        Ok(())
    }
}

/// Upload target configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Pre-signed URL used when none is given on the command line.
    /// Supports ${VAR} and ${VAR:-default} expansion.
    #[serde(default)]
    pub url: Option<String>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Size of body chunks read from disk; one progress event per chunk. Default: 256KB
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Connect timeout in seconds. Default: none
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            connect_timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_chunk_size() -> usize {
    262144 // 256KB
}

fn default_user_agent() -> String {
    format!("presign-uploadr/{}", env!("CARGO_PKG_VERSION"))
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set. Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Whether `level` names a tracing level (case-insensitive)
pub fn is_valid_log_level(level: &str) -> bool {
    matches!(
        level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
