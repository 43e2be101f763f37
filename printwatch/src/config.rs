//! Configuration for the printer notifier.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use printwatch_common::LoggingConfig;

use crate::error::{Result, WatchError};

/// Complete notifier configuration.
///
/// Every section has defaults, so an empty file (or no file at all) is a
/// valid configuration apart from the webhook URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintwatchConfig {
    /// Chat webhook settings
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Polling settings
    #[serde(default)]
    pub poller: PollerConfig,

    /// Printer registry location
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat webhook configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL. Without it, status changes are only logged.
    #[serde(default)]
    pub url: Option<String>,

    /// Display name the messages are posted under
    #[serde(default = "default_username")]
    pub username: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_username() -> String {
    "Snapmaker-U1".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: default_username(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl WebhookConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Pause between cycles in seconds
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum number of printers polled at the same time
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Telemetry request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_max_workers() -> usize {
    10
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_workers: default_max_workers(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl PollerConfig {
    /// Pause between cycles as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Telemetry request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Printer registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path of the JSON device list
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("printers.json")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

impl PrintwatchConfig {
    /// Parse a JSON5 file without validating it.
    ///
    /// Overrides from the command line and environment are applied before
    /// [`validate`](Self::validate) runs.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WatchError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: PrintwatchConfig = json5::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.poller.interval_secs == 0 {
            return Err(WatchError::validation(
                "poller.interval_secs must be greater than 0",
            ));
        }

        if self.poller.max_workers == 0 {
            return Err(WatchError::validation(
                "poller.max_workers must be greater than 0",
            ));
        }

        if self.poller.timeout_ms == 0 || self.webhook.timeout_ms == 0 {
            return Err(WatchError::validation("timeouts must be greater than 0"));
        }

        if self.registry.path.as_os_str().is_empty() {
            return Err(WatchError::validation("registry.path cannot be empty"));
        }

        if let Some(url) = &self.webhook.url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| WatchError::validation(format!("invalid webhook URL: {}", e)))?;

            match parsed.scheme() {
                "http" | "https" => {}
                other => {
                    return Err(WatchError::validation(format!(
                        "webhook URL must use http or https, got '{}'",
                        other
                    )));
                }
            }
        }

        Ok(())
    }
}
