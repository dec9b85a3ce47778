//! # Pulseclock
//!
//! Drives a polarity-pulsed analogue clock movement so it follows a remote
//! fast clock.
//!
//! The fast clock runs accelerated model time and publishes a status snapshot.
//! Pulseclock polls that snapshot, compares it with where it believes the
//! hands are, and moves them one minute per alternating-polarity pulse. When
//! the hands are more than a minute behind it pulses them forward at a fixed
//! cadence until they catch up.
//!
//! ## Core Concepts
//!
//! - **TimeOfDay**: minute-resolution wall-clock arithmetic in 12- or 24-hour mode.
//! - **Sinks**: anything that reacts to the engine, described by capability
//!   traits (`PulseSink`, `ControlSink`, `StatusSink`, `FastForwardSink`).
//!   A sink that fails or panics is logged and never stops its siblings.
//! - **PulseEngine**: the state machine that turns status snapshots into pulses
//!   and clock-state notifications.
//! - **AnalogueTimeStore**: best-effort persistence of the hand position, so a
//!   restart resumes where the hands physically are.
//! - **EngineEvent**: a broadcast stream of everything the engine does.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pulseclock::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = PulseSettings::load(None)?;
//!     let restart_time = settings.analogue_start_time()?;
//!
//!     let sinks: Vec<Arc<dyn Sink>> = vec![Arc::new(LoggingSink::new())];
//!     let mut engine = PulseEngine::new(settings, sinks, false, restart_time);
//!
//!     let mut events = engine.subscribe_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Engine event: {:?}", event);
//!         }
//!     });
//!
//!     engine.update(ClockStatus::running("06:00")).await;
//!     engine.update(ClockStatus::running("06:01")).await;
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Pulse Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod poller;
pub mod status;
pub mod store;
pub mod time;

/// A prelude module for easy importing of the most common Pulseclock types.
pub mod prelude {
    pub use crate::common::{Polarity, SinkId};
    pub use crate::components::capability::{
        ControlSink, FastForwardSink, PulseSink, Sink, StatusSink,
    };
    pub use crate::components::logging::LoggingSink;
    pub use crate::components::simulation::AnalogueClockSimulationSink;
    pub use crate::components::udp::UdpBroadcastSink;
    pub use crate::config::PulseSettings;
    pub use crate::engine::PulseEngine;
    pub use crate::events::EngineEvent;
    pub use crate::poller::{HttpStatusSource, StatusPoller, StatusSource};
    pub use crate::status::ClockStatus;
    pub use crate::time::{HourMode, TimeOfDay};
}
