//! Defines all configuration structures for the Pulseclock engine.
//!
//! These structs are designed to be deserialized from a TOML file using
//! `serde` and the `config` crate, with environment variables layered on top
//! (prefix `PULSECLOCK`, `__` between nested keys, e.g.
//! `PULSECLOCK_SINKS__SIMULATION=true`).

use crate::time::{HourMode, TimeError, TimeOfDay};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// The shortest time the clock line is held at zero voltage between pulses.
pub const MIN_ZERO_VOLTAGE_DURATION: Duration = Duration::from_millis(250);

/// The top-level configuration for the `PulseEngine` and its collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct PulseSettings {
    /// Where the poller fetches the fast clock status from.
    #[serde(default = "default_remote_clock_time_href")]
    pub remote_clock_time_href: String,

    /// The analogue time assumed when no persisted record is usable.
    #[serde(default = "default_analogue_clock_start_time")]
    pub analogue_clock_start_time: String,

    #[serde(default)]
    pub use_12_hour_clock: bool,

    /// Swap positive and negative pulses for clocks wired the other way round.
    #[serde(default)]
    pub flip_polarity: bool,

    #[serde(default = "default_poll_interval_seconds")]
    pub poll_interval_seconds: u64,

    /// How long the polarity voltage is held for each minute.
    #[serde(default = "default_pulse_duration_milliseconds")]
    pub pulse_duration_milliseconds: u64,

    /// The cadence of one minute while fast-forwarding. The part of it not
    /// spent in the pulse is spent at zero voltage.
    #[serde(default = "default_fast_forward_interval_milliseconds")]
    pub fast_forward_interval_milliseconds: u64,

    #[serde(default = "default_error_wait_retry_milliseconds")]
    pub error_wait_retry_milliseconds: u64,

    /// Delay between the stopped and the session-completed notifications.
    #[serde(default = "default_session_ended_indication_milliseconds")]
    pub session_ended_indication_milliseconds: u64,

    /// The file holding the last known analogue time.
    #[serde(default = "default_analogue_time_file")]
    pub analogue_time_file: PathBuf,

    /// Which of the built-in sinks the daemon registers.
    #[serde(default)]
    pub sinks: SinkSettings,
}

/// Selection of the built-in sinks.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkSettings {
    #[serde(default = "default_true")]
    pub logging: bool,

    /// A software clock face that follows the pulses.
    #[serde(default)]
    pub simulation: bool,

    /// Broadcast address for the UDP sink, e.g. `255.255.255.255:10000`.
    #[serde(default)]
    pub udp_broadcast: Option<SocketAddr>,
}

impl PulseSettings {
    /// Loads settings from an optional TOML file plus `PULSECLOCK_*` variables.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings: PulseSettings = builder
            .add_source(
                config::Environment::with_prefix("PULSECLOCK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to parse configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the engine cannot run with.
    ///
    /// A pulse that is not shorter than the fast-forward cadence is accepted
    /// with a warning, since the zero phase is floored anyway.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.analogue_start_time()
            .context("analogue_clock_start_time")?;
        if self.pulse_duration_milliseconds == 0 {
            bail!("pulse_duration_milliseconds must be greater than zero");
        }
        if self.fast_forward_interval_milliseconds == 0 {
            bail!("fast_forward_interval_milliseconds must be greater than zero");
        }
        if self.poll_interval_seconds == 0 {
            bail!("poll_interval_seconds must be greater than zero");
        }
        if self.pulse_duration_milliseconds >= self.fast_forward_interval_milliseconds {
            warn!(
                "Pulse duration {} ms is not shorter than the fast-forward interval {} ms; zero phase is floored to {:?}.",
                self.pulse_duration_milliseconds,
                self.fast_forward_interval_milliseconds,
                MIN_ZERO_VOLTAGE_DURATION
            );
        }
        Ok(())
    }

    pub fn hour_mode(&self) -> HourMode {
        HourMode::from_12_hour_flag(self.use_12_hour_clock)
    }

    pub fn analogue_start_time(&self) -> Result<TimeOfDay, TimeError> {
        TimeOfDay::parse(Some(&self.analogue_clock_start_time), self.hour_mode())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn pulse_duration(&self) -> Duration {
        Duration::from_millis(self.pulse_duration_milliseconds)
    }

    pub fn fast_forward_interval(&self) -> Duration {
        Duration::from_millis(self.fast_forward_interval_milliseconds)
    }

    /// The remainder of the fast-forward cadence after the pulse, floored at
    /// [`MIN_ZERO_VOLTAGE_DURATION`].
    pub fn zero_voltage_duration(&self) -> Duration {
        self.fast_forward_interval()
            .saturating_sub(self.pulse_duration())
            .max(MIN_ZERO_VOLTAGE_DURATION)
    }

    pub fn error_retry_delay(&self) -> Duration {
        Duration::from_millis(self.error_wait_retry_milliseconds)
    }

    pub fn session_ended_delay(&self) -> Duration {
        Duration::from_millis(self.session_ended_indication_milliseconds)
    }
}

// --- Default value functions for serde ---

fn default_remote_clock_time_href() -> String {
    "https://fastclock.azurewebsites.net/api/clocks/demo/time".to_string()
}

fn default_analogue_clock_start_time() -> String {
    "06:00".to_string()
}

fn default_poll_interval_seconds() -> u64 {
    2
}

fn default_pulse_duration_milliseconds() -> u64 {
    300
}

fn default_fast_forward_interval_milliseconds() -> u64 {
    1000
}

fn default_error_wait_retry_milliseconds() -> u64 {
    5000
}

fn default_session_ended_indication_milliseconds() -> u64 {
    3000
}

fn default_analogue_time_file() -> PathBuf {
    PathBuf::from("analogue_time.txt")
}

fn default_true() -> bool {
    true
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            logging: default_true(),
            simulation: false,
            udp_broadcast: None,
        }
    }
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            remote_clock_time_href: default_remote_clock_time_href(),
            analogue_clock_start_time: default_analogue_clock_start_time(),
            use_12_hour_clock: false,
            flip_polarity: false,
            poll_interval_seconds: default_poll_interval_seconds(),
            pulse_duration_milliseconds: default_pulse_duration_milliseconds(),
            fast_forward_interval_milliseconds: default_fast_forward_interval_milliseconds(),
            error_wait_retry_milliseconds: default_error_wait_retry_milliseconds(),
            session_ended_indication_milliseconds: default_session_ended_indication_milliseconds(),
            analogue_time_file: default_analogue_time_file(),
            sinks: SinkSettings::default(),
        }
    }
}
