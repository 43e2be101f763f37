//! CLI argument parsing.
//!
//! Every setting can also come from the environment (or a `.env` file), which
//! is how the notifier is usually deployed.

use std::path::PathBuf;

use clap::Parser;

use crate::config::PrintwatchConfig;
use crate::error::Result;

/// Polls Moonraker printers and posts status changes to a chat webhook.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "printwatch")]
#[command(version)]
pub struct Args {
    /// Path to an optional configuration file (JSON5 format).
    #[arg(short, long, env = "PRINTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chat webhook URL notifications are posted to.
    #[arg(long, env = "DISCORD_WEBHOOK")]
    pub webhook_url: Option<String>,

    /// Seconds to sleep between polling cycles.
    #[arg(long, env = "POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Maximum number of printers polled concurrently.
    #[arg(long, env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Path of the printer registry (JSON).
    #[arg(long, env = "PRINTER_FILE")]
    pub printer_file: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Build the effective configuration.
    ///
    /// Starts from the config file (or defaults), applies CLI/environment
    /// overrides, then validates the result.
    pub fn resolve(&self) -> Result<PrintwatchConfig> {
        let mut config = match &self.config {
            Some(path) => PrintwatchConfig::read_file(path)?,
            None => PrintwatchConfig::default(),
        };

        self.apply_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI/environment values on top of `config`.
    pub fn apply_overrides(&self, config: &mut PrintwatchConfig) {
        // An empty DISCORD_WEBHOOK= line in .env means "unset".
        if let Some(url) = self.webhook_url.as_deref().filter(|url| !url.is_empty()) {
            config.webhook.url = Some(url.to_string());
        }

        if let Some(interval) = self.poll_interval {
            config.poller.interval_secs = interval;
        }

        if let Some(workers) = self.max_workers {
            config.poller.max_workers = workers;
        }

        if let Some(path) = &self.printer_file {
            config.registry.path = path.clone();
        }

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
