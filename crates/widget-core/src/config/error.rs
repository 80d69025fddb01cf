//! # Widget Configuration Errors
//!
//! Errors raised by the [`ConfigGate`](crate::config::ConfigGate) and by
//! configuration file loading. `AlreadySet` and `NotSet` are fatal at
//! startup.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Application configuration already set")]
    AlreadySet,

    #[error("Application configuration not set")]
    NotSet,

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown or unsupported config format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to deserialize configuration from {format}: {message}")]
    Parse { format: String, message: String },

    #[error("Invalid value for configuration key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
