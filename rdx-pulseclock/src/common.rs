//! Contains common, primitive types shared across the Pulseclock crate.
//!
//! This module defines the key type used to identify registered sinks and the
//! voltage levels the engine drives onto the clock line.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a sink registered with the engine.
    ///
    /// Keys are handed out in registration order and never reused, so a log
    /// line naming a `SinkId` always refers to the same device.
    pub struct SinkId;
}

/// The voltage level applied to the clock line during one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Zero,
}

impl Polarity {
    /// The polarity that moves the clock off the given minute.
    ///
    /// Even minutes take a positive pulse and odd minutes a negative one;
    /// `flip` swaps the two for clocks wired the other way round.
    pub fn for_minute(minute: u32, flip: bool) -> Self {
        match (minute % 2 == 0, flip) {
            (true, false) | (false, true) => Polarity::Positive,
            (false, false) | (true, true) => Polarity::Negative,
        }
    }

    /// Nominal line voltage, used by monitors and the shell.
    pub fn volts(self) -> i8 {
        match self {
            Polarity::Positive => 12,
            Polarity::Negative => -12,
            Polarity::Zero => 0,
        }
    }
}
