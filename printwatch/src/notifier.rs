//! Status-change notifications posted to a chat webhook.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use printwatch_common::{JobSnapshot, PrinterStatus};

use crate::config::WebhookConfig;
use crate::error::Result;

/// A detected status transition of one printer.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    /// Printer name
    pub device: String,
    /// Printer address
    pub address: String,
    /// Status the printer moved to
    pub status: PrinterStatus,
    /// Job details at the time of the transition
    pub job: JobSnapshot,
    /// When the transition was observed
    pub detected_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Create an event stamped with the current time.
    pub fn new(
        device: impl Into<String>,
        address: impl Into<String>,
        status: PrinterStatus,
        job: JobSnapshot,
    ) -> Self {
        Self {
            device: device.into(),
            address: address.into(),
            status,
            job,
            detected_at: Utc::now(),
        }
    }
}

/// Error type for notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("No webhook URL configured")]
    NotConfigured,
    #[error("Webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Webhook rejected the message with HTTP status {0}")]
    Status(reqwest::StatusCode),
}

/// Destination for notification events.
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver one event. Called exactly once per transition, never retried.
    fn send(
        &self,
        event: &NotificationEvent,
    ) -> impl Future<Output = std::result::Result<(), NotifyError>> + Send;
}

/// Display style of a status in chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    /// Embed side-bar color (RGB)
    pub color: u32,
    /// Emoji shown in the title
    pub icon: &'static str,
    /// Upper-case label shown in the title and the State field
    pub label: &'static str,
}

const OFFLINE_STYLE: Style = Style {
    color: 0xED4245,
    icon: "🔴",
    label: "OFFLINE",
};

/// Read-only lookup from status to display style.
///
/// Statuses without an entry are shown with the `offline` style.
#[derive(Debug, Clone)]
pub struct StyleTable {
    styles: HashMap<PrinterStatus, Style>,
}

impl StyleTable {
    /// Build a table from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (PrinterStatus, Style)>) -> Self {
        Self {
            styles: entries.into_iter().collect(),
        }
    }

    /// Look up the style for `status`.
    pub fn get(&self, status: PrinterStatus) -> Style {
        self.styles
            .get(&status)
            .or_else(|| self.styles.get(&PrinterStatus::Offline))
            .copied()
            .unwrap_or(OFFLINE_STYLE)
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::from_entries([
            (PrinterStatus::Offline, OFFLINE_STYLE),
            (
                PrinterStatus::Printing,
                Style {
                    color: 0x5865F2,
                    icon: "▶️",
                    label: "STARTED",
                },
            ),
            (
                PrinterStatus::Complete,
                Style {
                    color: 0x57F287,
                    icon: "✅",
                    label: "COMPLETED",
                },
            ),
            (
                PrinterStatus::Cancelled,
                Style {
                    color: 0xED4245,
                    icon: "❌",
                    label: "CANCELLED",
                },
            ),
            (
                PrinterStatus::Idle,
                Style {
                    color: 0xAAAAAA,
                    icon: "⏸️",
                    label: "IDLE",
                },
            ),
        ])
    }
}

/// Webhook request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

/// A single rich embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// A name/value row of an embed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

/// Render an event as a webhook message.
pub fn build_payload(
    event: &NotificationEvent,
    styles: &StyleTable,
    username: &str,
) -> WebhookPayload {
    let style = styles.get(event.status);

    let embed = Embed {
        title: format!("{} {} {}", event.device, style.icon, style.label),
        color: style.color,
        fields: vec![
            EmbedField::new("State", style.label, true),
            EmbedField::new("Time", event.job.time.as_str(), true),
            EmbedField::new("Filament", event.job.filament.as_str(), true),
            EmbedField::new("File", event.job.file.as_str(), false),
        ],
        timestamp: Some(event.detected_at.to_rfc3339()),
    };

    WebhookPayload {
        username: username.to_string(),
        embeds: vec![embed],
    }
}

/// Posts events to the configured webhook.
///
/// Delivery is best effort: one attempt with a short timeout.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
    username: String,
    styles: StyleTable,
}

impl Notifier {
    /// Create a notifier from the webhook configuration.
    pub fn new(config: &WebhookConfig, styles: StyleTable) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            webhook_url: config.url.clone(),
            username: config.username.clone(),
            styles,
        })
    }

    /// Whether a webhook URL is configured.
    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Render an event with this notifier's styles and username.
    pub fn payload(&self, event: &NotificationEvent) -> WebhookPayload {
        build_payload(event, &self.styles, &self.username)
    }
}

impl NotificationSink for Notifier {
    async fn send(&self, event: &NotificationEvent) -> std::result::Result<(), NotifyError> {
        let Some(url) = &self.webhook_url else {
            return Err(NotifyError::NotConfigured);
        };

        let response = self
            .client
            .post(url)
            .json(&self.payload(event))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }

        Ok(())
    }
}
