//! Printer status taxonomy and the telemetry classifier.

use serde::{Deserialize, Serialize};

/// Classified state of a monitored printer.
///
/// Transitions are detected by inequality only; there is no ordering between
/// the variants and any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterStatus {
    /// The printer could not be reached or returned an unusable response.
    Offline,
    /// A job is running.
    Printing,
    /// No job is running (standby, paused, error and unknown states).
    Idle,
    /// The last job finished.
    Complete,
    /// The last job was cancelled.
    Cancelled,
}

impl PrinterStatus {
    /// Every status, in display order.
    pub const ALL: [PrinterStatus; 5] = [
        PrinterStatus::Offline,
        PrinterStatus::Printing,
        PrinterStatus::Idle,
        PrinterStatus::Complete,
        PrinterStatus::Cancelled,
    ];

    /// Map a raw `print_stats.state` value onto the status taxonomy.
    ///
    /// The mapping is total: anything that is not `printing`, `complete` or
    /// `cancelled`, including a missing state, is [`PrinterStatus::Idle`].
    /// [`PrinterStatus::Offline`] is never produced here; it is reserved for
    /// polls that fail before any telemetry is available.
    pub fn classify(state: Option<&str>) -> Self {
        match state {
            Some("printing") => PrinterStatus::Printing,
            Some("complete") => PrinterStatus::Complete,
            Some("cancelled") => PrinterStatus::Cancelled,
            _ => PrinterStatus::Idle,
        }
    }

    /// Return the wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterStatus::Offline => "offline",
            PrinterStatus::Printing => "printing",
            PrinterStatus::Idle => "idle",
            PrinterStatus::Complete => "complete",
            PrinterStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
