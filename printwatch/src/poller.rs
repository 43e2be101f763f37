//! Per-device polling and transition detection.

use tracing::{debug, info, warn};

use printwatch_common::{JobSnapshot, PrinterStatus};

use crate::notifier::{NotificationEvent, NotificationSink, NotifyError};
use crate::registry::Device;
use crate::telemetry::{PrintStats, TelemetrySource};

/// Result of polling one printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Classified status
    pub status: PrinterStatus,
    /// Job details reported with it
    pub job: JobSnapshot,
}

impl Observation {
    /// Observation for a printer that could not be read.
    pub fn offline() -> Self {
        Self {
            status: PrinterStatus::Offline,
            job: JobSnapshot::empty(),
        }
    }

    /// Classify a successfully fetched `print_stats` object.
    pub fn from_stats(stats: &PrintStats) -> Self {
        Self {
            status: PrinterStatus::classify(stats.state.as_deref()),
            job: JobSnapshot::from_stats(
                stats.filename.as_deref(),
                stats.print_duration,
                stats.filament_used,
            ),
        }
    }
}

/// Polls printers and reports status transitions.
pub struct DevicePoller<S, N> {
    source: S,
    sink: N,
}

impl<S: TelemetrySource, N: NotificationSink> DevicePoller<S, N> {
    /// Create a poller reading from `source` and notifying `sink`.
    pub fn new(source: S, sink: N) -> Self {
        Self { source, sink }
    }

    /// Get a reference to the telemetry source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a reference to the notification sink.
    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Fetch and classify the current state of `device`.
    ///
    /// Never fails: any transport or decoding problem is an `offline`
    /// observation.
    pub async fn observe(&self, device: &Device) -> Observation {
        match self.source.fetch(&device.ip).await {
            Ok(stats) => Observation::from_stats(&stats),
            Err(e) => {
                debug!(device = %device.name, address = %device.ip, error = %e, "Poll failed");
                Observation::offline()
            }
        }
    }

    /// Poll `device` and notify if its status changed.
    ///
    /// On a transition the event is dispatched and `device.last_status` is
    /// updated, whether or not delivery succeeded. Returns the event, or
    /// `None` when the status is unchanged (in which case `device` is left
    /// untouched).
    pub async fn check(&self, device: &mut Device) -> Option<NotificationEvent> {
        let observation = self.observe(device).await;
        self.apply(device, observation).await
    }

    /// Compare `observation` to the stored status and act on a change.
    pub async fn apply(
        &self,
        device: &mut Device,
        observation: Observation,
    ) -> Option<NotificationEvent> {
        if device.last_status == Some(observation.status) {
            return None;
        }

        info!(
            device = %device.name,
            from = device.last_status.map(|s| s.as_str()).unwrap_or("unknown"),
            to = %observation.status,
            "Printer status changed"
        );

        let event = NotificationEvent::new(
            device.name.clone(),
            device.ip.clone(),
            observation.status,
            observation.job,
        );

        match self.sink.send(&event).await {
            Ok(()) => debug!(device = %device.name, "Notification delivered"),
            Err(NotifyError::NotConfigured) => {
                debug!(device = %device.name, "No webhook configured, notification dropped")
            }
            Err(e) => warn!(device = %device.name, error = %e, "Failed to deliver notification"),
        }

        device.last_status = Some(event.status);
        Some(event)
    }
}
