//! Contains the output side of the engine: sinks and their registry.
//!
//! A sink is any device that wants to hear about the clock: a relay board, a
//! network broadcaster, a log. Each one opts into the capabilities it cares
//! about, and the `SinkRegistry` fans every notification out to exactly the
//! sinks that implement it.

pub mod capability;
pub mod logging;
pub mod registry;
pub mod simulation;
pub mod udp;
