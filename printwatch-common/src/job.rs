//! Per-poll job snapshot and its display formatting.

use serde::{Deserialize, Serialize};

/// Placeholder rendered for any job field that is unknown.
pub const PLACEHOLDER: &str = "-";

/// Human-readable summary of the job a printer reported during one poll.
///
/// Snapshots are never persisted; they only feed notification payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Active file name.
    pub file: String,
    /// Elapsed print time, e.g. `"1h 1m"`.
    pub time: String,
    /// Filament consumed, e.g. `"12.3 m"`.
    pub filament: String,
}

impl JobSnapshot {
    /// Snapshot used when nothing is known about the job.
    pub fn empty() -> Self {
        Self {
            file: PLACEHOLDER.to_string(),
            time: PLACEHOLDER.to_string(),
            filament: PLACEHOLDER.to_string(),
        }
    }

    /// Build a snapshot from raw `print_stats` values.
    ///
    /// An empty file name is treated like a missing one.
    pub fn from_stats(
        filename: Option<&str>,
        print_duration: Option<f64>,
        filament_used: Option<f64>,
    ) -> Self {
        let file = match filename {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => PLACEHOLDER.to_string(),
        };

        Self {
            file,
            time: seconds_to_hm(print_duration),
            filament: mm_to_m(filament_used),
        }
    }
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Format a duration in seconds as `"{hours}h {minutes}m"`.
///
/// Both components are truncated, so `3661` becomes `"1h 1m"` and `3599`
/// becomes `"0h 59m"`.
pub fn seconds_to_hm(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds else {
        return PLACEHOLDER.to_string();
    };

    let hours = (seconds / 3600.0).floor() as i64;
    let minutes = (seconds.rem_euclid(3600.0) / 60.0).floor() as i64;
    format!("{}h {}m", hours, minutes)
}

/// Format a filament length in millimetres as metres with one decimal.
pub fn mm_to_m(mm: Option<f64>) -> String {
    match mm {
        Some(mm) => format!("{:.1} m", mm / 1000.0),
        None => PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_to_hm() {
        assert_eq!(seconds_to_hm(None), "-");
        assert_eq!(seconds_to_hm(Some(3661.0)), "1h 1m");
        assert_eq!(seconds_to_hm(Some(0.0)), "0h 0m");
        assert_eq!(seconds_to_hm(Some(59.9)), "0h 0m");
        assert_eq!(seconds_to_hm(Some(3599.0)), "0h 59m");
        assert_eq!(seconds_to_hm(Some(7199.99)), "1h 59m");
        assert_eq!(seconds_to_hm(Some(90_000.0)), "25h 0m");
    }

    #[test]
    fn test_mm_to_m() {
        assert_eq!(mm_to_m(None), "-");
        assert_eq!(mm_to_m(Some(12345.0)), "12.3 m");
        assert_eq!(mm_to_m(Some(0.0)), "0.0 m");
        assert_eq!(mm_to_m(Some(999.0)), "1.0 m");
        assert_eq!(mm_to_m(Some(2500.0)), "2.5 m");
    }

    #[test]
    fn test_snapshot_from_stats() {
        let job = JobSnapshot::from_stats(Some("benchy.gcode"), Some(3661.0), Some(12345.0));
        assert_eq!(job.file, "benchy.gcode");
        assert_eq!(job.time, "1h 1m");
        assert_eq!(job.filament, "12.3 m");
    }

    #[test]
    fn test_snapshot_missing_fields() {
        let job = JobSnapshot::from_stats(None, None, None);
        assert_eq!(job, JobSnapshot::empty());

        let job = JobSnapshot::from_stats(Some(""), Some(60.0), None);
        assert_eq!(job.file, "-");
        assert_eq!(job.time, "0h 1m");
        assert_eq!(job.filament, "-");
    }
}
