//! Error types for the notifier.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`WatchError`].
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that stop the notifier.
///
/// Per-device failures never show up here: unreachable printers become
/// `offline` observations and undeliverable notifications are logged.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// The printer registry exists but could not be read.
    #[error("Failed to read printer registry {}: {source}", path.display())]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The printer registry is not a valid device list.
    #[error("Malformed printer registry {}: {source}", path.display())]
    RegistryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The printer registry could not be written.
    #[error("Failed to write printer registry {}: {source}", path.display())]
    RegistryWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }
}

impl From<json5::Error> for WatchError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient(err.to_string())
    }
}
