//! The status snapshot reported by the authoritative fast clock.

use serde::{Deserialize, Serialize};

/// One poll result from the fast clock.
///
/// Field names follow the remote API (`time`, `isRunning`, ...). Unknown fields
/// are ignored and missing flags read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClockStatus {
    /// The authoritative minute of the day as `HH:MM`.
    pub time: Option<String>,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_realtime: bool,
    pub is_unavailable: bool,
    pub is_completed: bool,
}

impl ClockStatus {
    /// A running clock showing `time`.
    pub fn running(time: impl Into<String>) -> Self {
        Self {
            time: Some(time.into()),
            is_running: true,
            ..Default::default()
        }
    }

    /// True when the analogue clock must stay parked for this snapshot.
    pub fn inhibits_movement(&self) -> bool {
        self.is_unavailable || self.is_realtime || self.is_paused || self.is_completed
    }

    /// Running with none of the flags that override `is_running`.
    ///
    /// `is_completed` is not one of them: a completed session is treated as
    /// stopped only once `is_running` has dropped.
    pub fn is_effectively_running(&self) -> bool {
        self.is_running && !self.is_realtime && !self.is_paused && !self.is_unavailable
    }

    /// Detects the "clock stopped" edge.
    ///
    /// Any snapshot carrying realtime, paused or unavailable counts, so the
    /// notification repeats for as long as one of those flags is set.
    pub fn was_stopped(&self, previous: Option<&ClockStatus>) -> bool {
        let stopped_running =
            previous.is_some_and(ClockStatus::is_effectively_running) && !self.is_running;
        stopped_running || self.is_realtime || self.is_paused || self.is_unavailable
    }

    /// Detects the "clock started" edge.
    pub fn was_started(&self, previous: Option<&ClockStatus>) -> bool {
        let was_idle = previous.map_or(true, |p| !p.is_effectively_running());
        was_idle && self.is_effectively_running()
    }
}
