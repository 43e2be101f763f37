//! The polling cycle: load, fan out, join, persist, sleep.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use printwatch_common::PrinterStatus;

use crate::config::PollerConfig;
use crate::error::Result;
use crate::notifier::NotificationSink;
use crate::poller::DevicePoller;
use crate::registry::{Device, RegistryStore};
use crate::telemetry::TelemetrySource;

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Devices in the registry
    pub devices: usize,
    /// Status transitions detected
    pub transitions: usize,
    /// Devices currently offline
    pub offline: usize,
    /// Poll tasks that panicked (their devices keep the old status)
    pub failed_workers: usize,
}

/// Drives repeated polling of every registered printer.
///
/// Cycles never overlap: all polls of a cycle finish before the registry
/// is written and the next sleep starts.
pub struct Scheduler<S, N> {
    poller: Arc<DevicePoller<S, N>>,
    store: RegistryStore,
    interval: Duration,
    max_workers: usize,
}

impl<S: TelemetrySource, N: NotificationSink> Scheduler<S, N> {
    /// Create a scheduler.
    ///
    /// `config` is expected to have passed
    /// [`PrintwatchConfig::validate`](crate::config::PrintwatchConfig::validate);
    /// a `max_workers` of zero would never poll anything.
    pub fn new(poller: DevicePoller<S, N>, store: RegistryStore, config: &PollerConfig) -> Self {
        Self {
            poller: Arc::new(poller),
            store,
            interval: config.interval(),
            max_workers: config.max_workers,
        }
    }

    /// Get a reference to the device poller.
    pub fn poller(&self) -> &DevicePoller<S, N> {
        &self.poller
    }

    /// Get a reference to the registry store.
    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Run cycles forever.
    ///
    /// Only returns when the registry cannot be read or written.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            registry = %self.store.path().display(),
            interval_secs = self.interval.as_secs(),
            max_workers = self.max_workers,
            "Printer monitoring started"
        );

        loop {
            let started = Instant::now();
            let summary = self.run_cycle().await?;
            let elapsed = started.elapsed();

            if summary.transitions > 0 {
                tracing::info!(
                    devices = summary.devices,
                    transitions = summary.transitions,
                    offline = summary.offline,
                    ?elapsed,
                    "Cycle complete"
                );
            } else {
                tracing::debug!(
                    devices = summary.devices,
                    offline = summary.offline,
                    ?elapsed,
                    "Cycle complete, no changes"
                );
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run a single cycle: load the registry, poll every device, save.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let mut devices = self.store.load()?;
        let summary = self.poll_all(&mut devices).await;
        self.store.save(&devices)?;
        Ok(summary)
    }

    /// Poll all `devices` with at most `max_workers` polls in flight.
    ///
    /// Each task works on its own copy of a device; the copies are written
    /// back into their original slots once every task has finished.
    pub async fn poll_all(&self, devices: &mut [Device]) -> CycleSummary {
        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();

        for (index, device) in devices.iter().cloned().enumerate() {
            let poller = Arc::clone(&self.poller);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let mut device = device;
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, device, false);
                };
                let changed = poller.check(&mut device).await.is_some();
                (index, device, changed)
            });
        }

        let mut summary = CycleSummary {
            devices: devices.len(),
            ..Default::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, device, changed)) => {
                    if changed {
                        summary.transitions += 1;
                    }
                    devices[index] = device;
                }
                Err(e) => {
                    summary.failed_workers += 1;
                    tracing::error!(error = %e, "Poll task failed");
                }
            }
        }

        summary.offline = devices
            .iter()
            .filter(|d| d.last_status == Some(PrinterStatus::Offline))
            .count();

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{NotificationEvent, NotifyError};
    use crate::poller::tests::{FakeSource, RecordingSink};
    use crate::telemetry::{PollError, PrintStats};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(max_workers: usize) -> PollerConfig {
        PollerConfig {
            interval_secs: 1,
            max_workers,
            timeout_ms: 1000,
        }
    }

    /// Source that takes a while to answer and tracks concurrency.
    #[derive(Default)]
    struct SlowSource {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl TelemetrySource for SlowSource {
        async fn fetch(&self, _address: &str) -> std::result::Result<PrintStats, PollError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(PrintStats {
                state: Some("printing".to_string()),
                ..Default::default()
            })
        }
    }

    /// Sink that panics for one device name.
    struct PanickingSink;

    impl NotificationSink for PanickingSink {
        async fn send(&self, event: &NotificationEvent) -> std::result::Result<(), NotifyError> {
            if event.device == "bad" {
                panic!("sink exploded");
            }
            Ok(())
        }
    }

    fn registry() -> (tempfile::TempDir, RegistryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("printers.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_bounded_concurrency_polls_everyone() {
        let scheduler = Scheduler::new(
            DevicePoller::new(SlowSource::default(), RecordingSink::default()),
            RegistryStore::new("unused.json"),
            &config(4),
        );

        let mut devices: Vec<Device> = (0..25)
            .map(|i| Device::new(format!("printer-{i}"), format!("10.0.0.{i}")))
            .collect();

        let summary = scheduler.poll_all(&mut devices).await;

        let source = scheduler.poller().source();
        assert_eq!(source.calls.load(Ordering::SeqCst), 25);
        assert!(source.peak.load(Ordering::SeqCst) <= 4);
        assert_eq!(summary.devices, 25);
        assert_eq!(summary.transitions, 25);
        assert!(
            devices
                .iter()
                .all(|d| d.last_status == Some(PrinterStatus::Printing))
        );
    }

    #[tokio::test]
    async fn test_cycle_persists_and_preserves_order() {
        let (_dir, store) = registry();
        store
            .save(&[
                Device::new("a", "10.0.0.1").with_status(PrinterStatus::Idle),
                Device::new("b", "10.0.0.2").with_status(PrinterStatus::Idle),
                Device::new("c", "10.0.0.3"),
            ])
            .unwrap();

        let scheduler = Scheduler::new(
            DevicePoller::new(FakeSource::default(), RecordingSink::default()),
            store,
            &config(2),
        );
        scheduler.poller().source().set("10.0.0.1", "standby");
        scheduler.poller().source().set("10.0.0.2", "printing");

        let summary = scheduler.run_cycle().await.unwrap();
        assert_eq!(
            summary,
            CycleSummary {
                devices: 3,
                transitions: 2,
                offline: 1,
                failed_workers: 0,
            }
        );

        let saved = scheduler.store().load().unwrap();
        let names: Vec<&str> = saved.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(saved[0].last_status, Some(PrinterStatus::Idle));
        assert_eq!(saved[1].last_status, Some(PrinterStatus::Printing));
        assert_eq!(saved[2].last_status, Some(PrinterStatus::Offline));

        // Nothing changed: second cycle is silent
        let summary = scheduler.run_cycle().await.unwrap();
        assert_eq!(summary.transitions, 0);
        assert_eq!(scheduler.poller().sink().statuses().len(), 2);
    }

    #[tokio::test]
    async fn test_cycle_without_registry() {
        let (_dir, store) = registry();
        let scheduler = Scheduler::new(
            DevicePoller::new(FakeSource::default(), RecordingSink::default()),
            store,
            &config(10),
        );

        let summary = scheduler.run_cycle().await.unwrap();

        assert_eq!(summary, CycleSummary::default());
        assert!(scheduler.store().load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_fails_on_corrupt_registry() {
        let (_dir, store) = registry();
        std::fs::write(store.path(), "[{").unwrap();

        let scheduler = Scheduler::new(
            DevicePoller::new(FakeSource::default(), RecordingSink::default()),
            store,
            &config(10),
        );

        assert!(scheduler.run_cycle().await.is_err());
    }

    #[tokio::test]
    async fn test_panicking_worker_keeps_old_status() {
        let scheduler = Scheduler::new(
            DevicePoller::new(SlowSource::default(), PanickingSink),
            RegistryStore::new("unused.json"),
            &config(2),
        );

        let mut devices = vec![
            Device::new("good", "10.0.0.1").with_status(PrinterStatus::Idle),
            Device::new("bad", "10.0.0.2").with_status(PrinterStatus::Idle),
        ];

        let summary = scheduler.poll_all(&mut devices).await;

        assert_eq!(summary.failed_workers, 1);
        assert_eq!(summary.transitions, 1);
        assert_eq!(devices[0].last_status, Some(PrinterStatus::Printing));
        assert_eq!(devices[1].last_status, Some(PrinterStatus::Idle));
    }

    /// Source that records when each poll started and finished.
    struct TimedSource {
        polls: Arc<std::sync::Mutex<Vec<(tokio::time::Instant, tokio::time::Instant)>>>,
        delay: Duration,
    }

    impl TelemetrySource for TimedSource {
        async fn fetch(&self, _address: &str) -> std::result::Result<PrintStats, PollError> {
            let started = tokio::time::Instant::now();
            tokio::time::sleep(self.delay).await;
            self.polls
                .lock()
                .unwrap()
                .push((started, tokio::time::Instant::now()));
            Ok(PrintStats::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_between_whole_cycles() {
        let (_dir, store) = registry();
        store
            .save(&[
                Device::new("a", "10.0.0.1"),
                Device::new("b", "10.0.0.2"),
                Device::new("c", "10.0.0.3"),
            ])
            .unwrap();

        let polls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let source = TimedSource {
            polls: Arc::clone(&polls),
            delay: Duration::from_secs(1),
        };
        let config = PollerConfig {
            interval_secs: 30,
            max_workers: 3,
            timeout_ms: 1000,
        };
        let scheduler = Scheduler::new(
            DevicePoller::new(source, RecordingSink::default()),
            store,
            &config,
        );

        // Cycles start at 0s, 31s, 62s and 93s; the fourth is asleep at 95s.
        let result = tokio::time::timeout(Duration::from_secs(95), scheduler.run()).await;
        assert!(result.is_err(), "run() only returns on registry errors");

        let polls = polls.lock().unwrap().clone();
        assert_eq!(polls.len(), 12);

        let cycles: Vec<&[(tokio::time::Instant, tokio::time::Instant)]> =
            polls.chunks(3).collect();
        for cycle in &cycles {
            let first_start = cycle.iter().map(|(start, _)| *start).min().unwrap();
            let last_start = cycle.iter().map(|(start, _)| *start).max().unwrap();
            assert_eq!(first_start, last_start, "a cycle polls its devices together");
        }

        for pair in cycles.windows(2) {
            let previous_end = pair[0].iter().map(|(_, end)| *end).max().unwrap();
            let next_start = pair[1].iter().map(|(start, _)| *start).min().unwrap();
            assert!(next_start >= previous_end + config.interval());
            assert!(next_start < previous_end + config.interval() + Duration::from_secs(1));
        }
    }
}
