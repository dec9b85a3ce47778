//! A software clock face that follows the pulses like a real movement would.

use crate::components::capability::{ControlSink, PulseSink, Sink};
use crate::time::{HourMode, TimeOfDay};
use async_trait::async_trait;
use colored::Colorize;
use std::sync::Mutex;
use tracing::info;

/// Simulates a 12-hour stepper movement.
///
/// The movement steps off an even minute on a positive pulse and off an odd
/// minute on a negative one. A repeated pulse of the same polarity leaves the
/// hands where they are.
#[derive(Debug)]
pub struct AnalogueClockSimulationSink {
    face: Mutex<TimeOfDay>,
}

impl AnalogueClockSimulationSink {
    const MODE: HourMode = HourMode::Twelve;

    pub fn new(initial_time: TimeOfDay) -> Self {
        Self {
            face: Mutex::new(initial_time.on_dial(Self::MODE)),
        }
    }

    /// The position of the simulated hands.
    pub fn time(&self) -> TimeOfDay {
        *self.lock_face()
    }

    fn step_if(&self, even_minute: bool) -> TimeOfDay {
        let mut face = self.lock_face();
        if (face.minute() % 2 == 0) == even_minute {
            *face = face.add_one_minute(Self::MODE);
        }
        info!(
            "{}",
            format!("Analogue clock simulator time: {}", face.render(Self::MODE))
                .blue()
                .bold()
        );
        *face
    }

    fn lock_face(&self) -> std::sync::MutexGuard<'_, TimeOfDay> {
        // The guarded value is a plain Copy time, so a poisoned lock is still usable.
        self.face.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl PulseSink for AnalogueClockSimulationSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        self.step_if(true);
        Ok(())
    }

    async fn negative_voltage(&self) -> anyhow::Result<()> {
        self.step_if(false);
        Ok(())
    }

    async fn zero_voltage(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ControlSink for AnalogueClockSimulationSink {
    async fn initialize(&self, analogue_start_time: TimeOfDay) -> anyhow::Result<()> {
        let mut face = self.lock_face();
        *face = analogue_start_time.on_dial(Self::MODE);
        info!("Analogue clock simulator set to {}.", face.render(Self::MODE));
        Ok(())
    }

    async fn cleanup(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl Sink for AnalogueClockSimulationSink {
    fn name(&self) -> &str {
        "analogue clock simulation"
    }

    fn as_pulse(&self) -> Option<&dyn PulseSink> {
        Some(self)
    }

    fn as_control(&self) -> Option<&dyn ControlSink> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn alternating_pulses_move_the_hands() {
        let sink = AnalogueClockSimulationSink::new(t("06:00"));
        sink.positive_voltage().await.unwrap();
        sink.zero_voltage().await.unwrap();
        sink.negative_voltage().await.unwrap();
        sink.zero_voltage().await.unwrap();
        assert_eq!(sink.time(), t("06:02"));
    }

    #[tokio::test]
    async fn repeated_polarity_is_ignored() {
        let sink = AnalogueClockSimulationSink::new(t("06:00"));
        sink.positive_voltage().await.unwrap();
        sink.positive_voltage().await.unwrap();
        assert_eq!(sink.time(), t("06:01"));
    }

    #[tokio::test]
    async fn face_wraps_at_twelve() {
        let sink = AnalogueClockSimulationSink::new(t("12:59"));
        sink.negative_voltage().await.unwrap();
        assert_eq!(sink.time(), t("01:00"));
    }

    #[tokio::test]
    async fn initialize_sets_the_hands() {
        let sink = AnalogueClockSimulationSink::new(t("06:00"));
        sink.initialize(t("21:17")).await.unwrap();
        assert_eq!(sink.time(), t("09:17"));
    }

    #[test]
    fn afternoon_start_is_folded_onto_the_face() {
        let sink = AnalogueClockSimulationSink::new(t("18:30"));
        assert_eq!(sink.time(), t("06:30"));
    }
}
