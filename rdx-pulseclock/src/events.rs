//! Defines the observer events broadcast by the pulse engine.
//!
//! Nothing in the engine depends on these being received. They exist so that a
//! shell, a test or a status display can follow what the engine is doing
//! without registering as a sink.

use crate::common::Polarity;
use crate::time::TimeOfDay;

/// Events describing the engine's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Fired once, after the sinks have been initialized.
    Initialized { analogue_time: TimeOfDay },
    /// The fast clock started running.
    ClockStarted,
    /// The fast clock stopped or was parked.
    ClockStopped,
    /// The session ended, fired after the session-ended delay.
    SessionCompleted,
    /// A voltage phase was dispatched to the pulse sinks.
    Pulse { polarity: Polarity },
    /// The analogue clock moved one minute.
    AnalogueTimeAdvanced { analogue_time: TimeOfDay },
    /// A catch-up burst began.
    FastForwardStarted { from: TimeOfDay, to: TimeOfDay },
    /// A catch-up burst ended.
    FastForwardStopped { analogue_time: TimeOfDay },
    /// The persisted record could not be written and writes are now disabled.
    PersistenceDisabled,
    /// Fired once when the engine has cleaned up its sinks.
    EngineShutdown,
}
