//! Moonraker telemetry retrieval.
//!
//! Printers are queried with
//!
//! ```text
//! GET http://<ip>/printer/objects/query?print_stats
//! ```
//!
//! and answer with `{"result": {"status": {"print_stats": {...}}}}`.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Path and query of the `print_stats` object query.
pub const QUERY_PATH: &str = "/printer/objects/query?print_stats";

/// Build the telemetry URL for a printer address.
pub fn query_url(address: &str) -> String {
    format!("http://{}{}", address, QUERY_PATH)
}

/// Error type for telemetry requests.
///
/// Only logged; every variant turns into an `offline` observation.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("Malformed telemetry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The Moonraker `print_stats` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintStats {
    /// Raw Klipper state (`standby`, `printing`, `paused`, `complete`, ...)
    #[serde(default)]
    pub state: Option<String>,

    /// File of the current or last job
    #[serde(default)]
    pub filename: Option<String>,

    /// Time spent printing, in seconds
    #[serde(default)]
    pub print_duration: Option<f64>,

    /// Filament extruded for the job, in millimetres
    #[serde(default)]
    pub filament_used: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    status: QueryStatus,
}

#[derive(Debug, Deserialize)]
struct QueryStatus {
    print_stats: PrintStats,
}

/// Extract `print_stats` from a raw query response body.
pub fn parse_print_stats(body: &[u8]) -> std::result::Result<PrintStats, PollError> {
    let response: QueryResponse = serde_json::from_slice(body)?;
    Ok(response.result.status.print_stats)
}

/// Source of printer telemetry.
pub trait TelemetrySource: Send + Sync + 'static {
    /// Fetch the current `print_stats` of the printer at `address`.
    fn fetch(
        &self,
        address: &str,
    ) -> impl Future<Output = std::result::Result<PrintStats, PollError>> + Send;
}

/// HTTP client for the Moonraker API.
#[derive(Debug, Clone)]
pub struct MoonrakerClient {
    client: reqwest::Client,
}

impl MoonrakerClient {
    /// Create a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("printwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl TelemetrySource for MoonrakerClient {
    async fn fetch(&self, address: &str) -> std::result::Result<PrintStats, PollError> {
        let response = self.client.get(query_url(address)).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let body = response.bytes().await?;
        parse_print_stats(&body)
    }
}
