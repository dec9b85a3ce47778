//! The four capability contracts a sink may implement, in any combination.
//!
//! Every call is best effort from the engine's point of view: an `Err`, a
//! panic or a call that overruns its time budget is logged against the sink
//! and the engine carries on. An overrunning call is dropped mid-flight.

use crate::time::TimeOfDay;
use async_trait::async_trait;

/// Drives the clock line. Each call has 10 ms to complete.
///
/// Within one minute a polarity call is always followed by `zero_voltage`;
/// nothing else about ordering is guaranteed.
#[async_trait]
pub trait PulseSink: Send + Sync {
    async fn positive_voltage(&self) -> anyhow::Result<()>;
    async fn negative_voltage(&self) -> anyhow::Result<()>;
    async fn zero_voltage(&self) -> anyhow::Result<()>;
}

/// Start-up and shut-down hooks. Each call has 100 ms to complete.
#[async_trait]
pub trait ControlSink: Send + Sync {
    /// Called once, before any pulse, with the position the engine resumed at.
    async fn initialize(&self, analogue_start_time: TimeOfDay) -> anyhow::Result<()>;
    /// Called once at shutdown.
    async fn cleanup(&self) -> anyhow::Result<()>;
}

/// Edge-triggered fast clock state changes, for lamps and buzzers.
#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn clock_started(&self) -> anyhow::Result<()>;
    /// Also called before a session starts and after it ends.
    async fn clock_stopped(&self) -> anyhow::Result<()>;
    /// Called a configurable delay after `clock_stopped` when the session ended.
    async fn session_completed(&self) -> anyhow::Result<()>;
}

/// Brackets a catch-up burst.
#[async_trait]
pub trait FastForwardSink: Send + Sync {
    async fn fast_forward_started(&self) -> anyhow::Result<()>;
    async fn fast_forward_stopped(&self) -> anyhow::Result<()>;
}

/// A device registered with the engine.
///
/// The `as_*` methods advertise capabilities; the defaults advertise none, so
/// an implementation only overrides the ones it supports:
///
/// ```rust
/// use async_trait::async_trait;
/// use pulseclock::components::capability::{PulseSink, Sink};
///
/// struct Lamp;
///
/// #[async_trait]
/// impl PulseSink for Lamp {
///     async fn positive_voltage(&self) -> anyhow::Result<()> { Ok(()) }
///     async fn negative_voltage(&self) -> anyhow::Result<()> { Ok(()) }
///     async fn zero_voltage(&self) -> anyhow::Result<()> { Ok(()) }
/// }
///
/// impl Sink for Lamp {
///     fn name(&self) -> &str { "lamp" }
///     fn as_pulse(&self) -> Option<&dyn PulseSink> { Some(self) }
/// }
/// ```
pub trait Sink: Send + Sync {
    /// Identifies the sink in log lines.
    fn name(&self) -> &str;

    fn as_pulse(&self) -> Option<&dyn PulseSink> {
        None
    }

    fn as_control(&self) -> Option<&dyn ControlSink> {
        None
    }

    fn as_status(&self) -> Option<&dyn StatusSink> {
        None
    }

    fn as_fast_forward(&self) -> Option<&dyn FastForwardSink> {
        None
    }

    /// Releases process-held resources. Called once at shutdown, after every
    /// control sink has been cleaned up.
    fn release(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
