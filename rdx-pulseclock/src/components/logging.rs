//! A sink that logs every notification it receives.

use crate::components::capability::{ControlSink, FastForwardSink, PulseSink, Sink, StatusSink};
use crate::time::TimeOfDay;
use async_trait::async_trait;
use colored::Colorize;
use tracing::info;

/// Implements every capability and reports each call through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LoggingSink;

impl LoggingSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PulseSink for LoggingSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        info!("{}", "Positive voltage".green().bold());
        Ok(())
    }

    async fn negative_voltage(&self) -> anyhow::Result<()> {
        info!("{}", "Negative voltage".red().bold());
        Ok(())
    }

    async fn zero_voltage(&self) -> anyhow::Result<()> {
        info!("{}", "Zero voltage".cyan().bold());
        Ok(())
    }
}

#[async_trait]
impl ControlSink for LoggingSink {
    async fn initialize(&self, analogue_start_time: TimeOfDay) -> anyhow::Result<()> {
        info!("Initialized logging sink with analogue time {}.", analogue_start_time);
        Ok(())
    }

    async fn cleanup(&self) -> anyhow::Result<()> {
        info!("Cleaned up logging sink.");
        Ok(())
    }
}

#[async_trait]
impl StatusSink for LoggingSink {
    async fn clock_started(&self) -> anyhow::Result<()> {
        info!("Clock was {}.", "started".green().bold());
        Ok(())
    }

    async fn clock_stopped(&self) -> anyhow::Result<()> {
        info!("Clock was {}.", "stopped".red().bold());
        Ok(())
    }

    async fn session_completed(&self) -> anyhow::Result<()> {
        info!("Session is {}.", "completed".red().bold());
        Ok(())
    }
}

#[async_trait]
impl FastForwardSink for LoggingSink {
    async fn fast_forward_started(&self) -> anyhow::Result<()> {
        info!("Analogue clock started fast forwarding.");
        Ok(())
    }

    async fn fast_forward_stopped(&self) -> anyhow::Result<()> {
        info!("Analogue clock stopped fast forwarding.");
        Ok(())
    }
}

impl Sink for LoggingSink {
    fn name(&self) -> &str {
        "logging"
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
