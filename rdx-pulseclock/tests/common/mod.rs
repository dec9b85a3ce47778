//! Shared fixtures for the engine scenarios.
#![allow(dead_code)]

use async_trait::async_trait;
use pulseclock::prelude::*;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Records every call it receives, in order.
#[derive(Default)]
pub struct MonitorSink {
    calls: Mutex<Vec<String>>,
}

impl MonitorSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sink(self: &Arc<Self>) -> Arc<dyn Sink> {
        self.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the voltage phases, as `+`, `-` and `0`.
    pub fn phases(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c == "+" || c == "-" || c == "0")
            .collect()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl PulseSink for MonitorSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        self.record("+");
        Ok(())
    }
    async fn negative_voltage(&self) -> anyhow::Result<()> {
        self.record("-");
        Ok(())
    }
    async fn zero_voltage(&self) -> anyhow::Result<()> {
        self.record("0");
        Ok(())
    }
}

#[async_trait]
impl ControlSink for MonitorSink {
    async fn initialize(&self, analogue_start_time: TimeOfDay) -> anyhow::Result<()> {
        self.record(format!("initialize {}", analogue_start_time));
        Ok(())
    }
    async fn cleanup(&self) -> anyhow::Result<()> {
        self.record("cleanup");
        Ok(())
    }
}

#[async_trait]
impl StatusSink for MonitorSink {
    async fn clock_started(&self) -> anyhow::Result<()> {
        self.record("started");
        Ok(())
    }
    async fn clock_stopped(&self) -> anyhow::Result<()> {
        self.record("stopped");
        Ok(())
    }
    async fn session_completed(&self) -> anyhow::Result<()> {
        self.record("completed");
        Ok(())
    }
}

#[async_trait]
impl FastForwardSink for MonitorSink {
    async fn fast_forward_started(&self) -> anyhow::Result<()> {
        self.record("fast forward started");
        Ok(())
    }
    async fn fast_forward_stopped(&self) -> anyhow::Result<()> {
        self.record("fast forward stopped");
        Ok(())
    }
}

impl Sink for MonitorSink {
    fn name(&self) -> &str {
        "monitor"
    }
    fn as_pulse(&self) -> Option<&dyn PulseSink> {
        Some(self)
    }
    fn as_control(&self) -> Option<&dyn ControlSink> {
        Some(self)
    }
    fn as_status(&self) -> Option<&dyn StatusSink> {
        Some(self)
    }
    fn as_fast_forward(&self) -> Option<&dyn FastForwardSink> {
        Some(self)
    }
}

/// Fails every call it supports.
pub struct FailingSink;

#[async_trait]
impl PulseSink for FailingSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn negative_voltage(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn zero_voltage(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
}

#[async_trait]
impl ControlSink for FailingSink {
    async fn initialize(&self, _analogue_start_time: TimeOfDay) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn cleanup(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
}

#[async_trait]
impl StatusSink for FailingSink {
    async fn clock_started(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn clock_stopped(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn session_completed(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
}

#[async_trait]
impl FastForwardSink for FailingSink {
    async fn fast_forward_started(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
    async fn fast_forward_stopped(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
}

impl Sink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }
    fn as_pulse(&self) -> Option<&dyn PulseSink> {
        Some(self)
    }
    fn as_control(&self) -> Option<&dyn ControlSink> {
        Some(self)
    }
    fn as_status(&self) -> Option<&dyn StatusSink> {
        Some(self)
    }
    fn as_fast_forward(&self) -> Option<&dyn FastForwardSink> {
        Some(self)
    }
    fn release(&self) -> anyhow::Result<()> {
        anyhow::bail!("serial port gone")
    }
}

/// Never finishes a pulse call.
pub struct HungSink;

#[async_trait]
impl PulseSink for HungSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        std::future::pending().await
    }
    async fn negative_voltage(&self) -> anyhow::Result<()> {
        std::future::pending().await
    }
    async fn zero_voltage(&self) -> anyhow::Result<()> {
        std::future::pending().await
    }
}

impl Sink for HungSink {
    fn name(&self) -> &str {
        "hung"
    }
    fn as_pulse(&self) -> Option<&dyn PulseSink> {
        Some(self)
    }
}

pub fn t(s: &str) -> TimeOfDay {
    s.parse().unwrap()
}

/// Default settings with the record kept under `dir`.
pub fn settings_in(dir: &Path) -> PulseSettings {
    PulseSettings {
        analogue_time_file: dir.join("analogue_time.txt"),
        ..Default::default()
    }
}

/// The fast timing used by the reference scenarios: a 100 ms pulse on a
/// 200 ms cadence, so the zero phase runs at its 250 ms floor.
pub fn quick_settings_in(dir: &Path) -> PulseSettings {
    PulseSettings {
        pulse_duration_milliseconds: 100,
        fast_forward_interval_milliseconds: 200,
        ..settings_in(dir)
    }
}

pub fn engine_with(
    settings: PulseSettings,
    sinks: Vec<Arc<dyn Sink>>,
    restart_time: &str,
) -> PulseEngine {
    PulseEngine::new(settings, sinks, false, t(restart_time))
}

pub fn record(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("analogue_time.txt")).unwrap()
}

pub fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}
