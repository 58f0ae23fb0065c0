//! Error types for controller construction, the data logger and config loading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Construction-time controller errors. `compute` itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error("Invalid configuration: output bounds [{min}, {max}] (min must be <= max and both must be numbers)")]
    InvalidConfiguration { min: f64, max: f64 },
}

/// Data logger sink errors.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Failed to open log sink {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write log entry: {0}")]
    Write(#[from] io::Error),
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Controller configuration error: {0}")]
    Controller(#[from] ControllerError),
}
