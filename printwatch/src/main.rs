//! printwatch: posts Moonraker printer status changes to a chat webhook.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use printwatch::{
    Args, DevicePoller, MoonrakerClient, Notifier, RegistryStore, Scheduler, StyleTable,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = args
        .resolve()
        .with_context(|| match &args.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => "Invalid configuration".to_string(),
        })?;

    printwatch_common::init_tracing(&config.logging).context("Failed to init tracing")?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting printwatch");

    let notifier = Notifier::new(&config.webhook, StyleTable::default())
        .context("Failed to create webhook client")?;
    if !notifier.is_configured() {
        warn!("No webhook URL configured (DISCORD_WEBHOOK); status changes will only be logged");
    }

    let source = MoonrakerClient::new(config.poller.timeout())
        .context("Failed to create telemetry client")?;

    let scheduler = Scheduler::new(
        DevicePoller::new(source, notifier),
        RegistryStore::new(&config.registry.path),
        &config.poller,
    );

    scheduler.run().await.context("Printer monitoring stopped")?;

    Ok(())
}
