//! Best-effort persistence of the analogue clock position.
//!
//! The record is a single `HH:MM` line. Losing it only means the clock has to
//! be set by hand after an unplanned restart, so nothing in here is allowed to
//! stop the engine from pulsing.

use crate::time::{HourMode, TimeOfDay};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Reads and writes the last known analogue time.
#[derive(Debug)]
pub struct AnalogueTimeStore {
    path: PathBuf,
    writes_disabled: bool,
}

impl AnalogueTimeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes_disabled: false,
        }
    }

    /// Opens a record that is read but never written, e.g. on a read-only mount.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes_disabled: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// False once a write has failed.
    pub fn is_writable(&self) -> bool {
        !self.writes_disabled
    }

    /// Returns the persisted time, or `None` when the record is absent or
    /// unusable. Never fails.
    pub fn load(&self, mode: HourMode) -> Option<TimeOfDay> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No persisted analogue time at {}.", self.path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Could not read persisted analogue time from {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        let content = content.trim();
        if content.len() < 5 {
            warn!(
                "Persisted analogue time {:?} in {} is too short, ignoring it.",
                content,
                self.path.display()
            );
            return None;
        }
        match TimeOfDay::parse(Some(content), mode) {
            Ok(time) => Some(time),
            Err(e) => {
                warn!(
                    "Persisted analogue time in {} is unusable: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Writes `time` unless an earlier write failed. Returns whether the
    /// record was written.
    pub fn save(&mut self, time: TimeOfDay, mode: HourMode) -> bool {
        if self.writes_disabled {
            return false;
        }
        match self.write(time, mode) {
            Ok(()) => {
                debug!("Persisted analogue time {}.", time.render(mode));
                true
            }
            Err(e) => {
                error!(
                    "Failed to persist analogue time to {}: {}. No further attempts will be made.",
                    self.path.display(),
                    e
                );
                self.writes_disabled = true;
                false
            }
        }
    }

    /// Overwrites the record with a restart time.
    pub fn force_save(&mut self, time: TimeOfDay, mode: HourMode) -> bool {
        info!(
            "Resetting persisted analogue time to {}.",
            time.render(mode)
        );
        self.save(time, mode)
    }

    fn write(&self, time: TimeOfDay, mode: HourMode) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, time.render(mode))
    }
}
