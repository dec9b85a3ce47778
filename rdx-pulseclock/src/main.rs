use anyhow::{Context, Result};
use clap::Parser;
use pulseclock::prelude::*;
use pulseclock::{ENGINE_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Keeps an analogue clock in step with a remote fast clock.
#[derive(Parser, Debug)]
#[command(name = "pulsed")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML settings file. `PULSECLOCK_*` variables override it.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overwrite the persisted analogue time with the restart time.
    #[arg(long)]
    reset: bool,

    /// Where the hands are when no persisted time is usable, as HH:MM.
    /// Defaults to `analogue_clock_start_time`.
    #[arg(long, value_name = "HH:MM")]
    restart_time: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging. RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // 2. Load settings and resolve the restart time.
    let settings = PulseSettings::load(cli.config.as_deref())?;
    let restart_time = match cli.restart_time.as_deref() {
        Some(input) => TimeOfDay::parse(Some(input), settings.hour_mode())
            .with_context(|| format!("invalid --restart-time {input:?}"))?,
        None => settings.analogue_start_time()?,
    };
    let href = settings.remote_clock_time_href.clone();

    // 3. Build the sinks and the engine.
    let sinks = build_sinks(&settings, restart_time);
    let mut engine = PulseEngine::new(settings, sinks, cli.reset, restart_time);
    let mut poller = StatusPoller::new(HttpStatusSource::new(href.clone())?, engine.settings());

    info!("{} v{} following {}", ENGINE_NAME, VERSION, href);

    // 4. Poll until Ctrl+C, then clean up the sinks.
    tokio::select! {
        _ = poller.run(&mut engine) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            info!("Ctrl+C received, stopping.");
        }
    }
    engine.shutdown().await;

    Ok(())
}

fn build_sinks(settings: &PulseSettings, restart_time: TimeOfDay) -> Vec<Arc<dyn Sink>> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
    if settings.sinks.logging {
        sinks.push(Arc::new(LoggingSink::new()));
    }
    if settings.sinks.simulation {
        sinks.push(Arc::new(AnalogueClockSimulationSink::new(restart_time)));
    }
    if let Some(endpoint) = settings.sinks.udp_broadcast {
        sinks.push(Arc::new(UdpBroadcastSink::new(endpoint)));
    }
    sinks
}
