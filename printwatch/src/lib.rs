//! Status-change notifier for Moonraker 3D printers.
//!
//! Every cycle the notifier reads the printer registry, polls each printer's
//! `print_stats` with bounded concurrency, posts a chat message for every
//! printer whose status changed since the previous cycle, and writes the
//! updated registry back.
//!
//! # Statuses
//!
//! | Klipper state        | Status      | Message      |
//! |----------------------|-------------|--------------|
//! | `printing`           | `printing`  | ▶️ STARTED   |
//! | `complete`           | `complete`  | ✅ COMPLETED |
//! | `cancelled`          | `cancelled` | ❌ CANCELLED |
//! | anything else        | `idle`      | ⏸️ IDLE      |
//! | no usable response   | `offline`   | 🔴 OFFLINE   |

pub mod args;
pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod registry;
pub mod scheduler;
pub mod telemetry;

pub use args::Args;
pub use config::PrintwatchConfig;
pub use error::{Result, WatchError};
pub use notifier::{NotificationEvent, NotificationSink, Notifier, StyleTable};
pub use poller::{DevicePoller, Observation};
pub use registry::{Device, RegistryStore};
pub use scheduler::{CycleSummary, Scheduler};
pub use telemetry::{MoonrakerClient, TelemetrySource};
