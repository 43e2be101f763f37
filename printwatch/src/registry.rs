//! Printer registry persisted as a JSON device list.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use printwatch_common::PrinterStatus;

use crate::error::{Result, WatchError};

/// A monitored printer and its last known status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Display name used in notifications
    pub name: String,

    /// Host (and optional port) of the Moonraker API
    #[serde(alias = "address")]
    pub ip: String,

    /// Status seen on the previous poll; `None` until the first poll
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<PrinterStatus>,

    /// Any other keys of the record, written back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Create a device that has never been polled.
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            last_status: None,
            extra: Map::new(),
        }
    }

    /// Set the last known status.
    pub fn with_status(mut self, status: PrinterStatus) -> Self {
        self.last_status = Some(status);
        self
    }
}

/// File-backed store for the device list.
///
/// Only one process is expected to write the file. Saves replace the file
/// atomically, so a crash mid-write never leaves a truncated registry.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    /// Create a store for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all devices.
    ///
    /// A missing file yields an empty list. Anything that is not a valid
    /// device list is an error.
    pub fn load(&self) -> Result<Vec<Device>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Registry not found, no devices");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(WatchError::RegistryRead {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| WatchError::RegistryParse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the registry with `devices`.
    pub fn save(&self, devices: &[Device]) -> Result<()> {
        let write_error = |source: std::io::Error| WatchError::RegistryWrite {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        serde_json::to_writer_pretty(&mut file, devices)
            .map_err(|e| write_error(std::io::Error::other(e)))?;
        file.write_all(b"\n").map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(&self.path).map_err(|e| write_error(e.error))?;

        tracing::trace!(path = %self.path.display(), devices = devices.len(), "Registry saved");
        Ok(())
    }
}
