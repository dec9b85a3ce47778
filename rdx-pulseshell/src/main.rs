use anyhow::Result;
use colored::Colorize;
use pulseclock::prelude::*;
use pulseclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

const COMMANDS: &[&str] = &[
    "time", "tick", "sync", "start", "stop", "pause", "resume", "realtime", "unavailable",
    "complete", "pulses", "show", "help", "exit",
];

/// Colours the command word by whether the shell knows it, and each argument by kind.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl CommandHighlighter {
    fn paint_argument(word: &str) -> String {
        match word {
            "on" => word.green().to_string(),
            "off" => word.red().to_string(),
            _ if word.parse::<TimeOfDay>().is_ok() => word.magenta().bold().to_string(),
            _ if word.parse::<u32>().is_ok() => word.yellow().to_string(),
            _ => word.dimmed().to_string(),
        }
    }
}

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut painted = if COMMANDS.contains(&command) {
            command.cyan().bold().to_string()
        } else {
            command.red().to_string()
        };
        if line.contains(' ') {
            painted.push(' ');
            let arguments = rest
                .split(' ')
                .map(Self::paint_argument)
                .collect::<Vec<_>>()
                .join(" ");
            painted.push_str(&arguments);
        }
        Cow::Owned(painted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    let rule = "-".repeat(72);

    println!("{}", rule.dimmed());
    println!("{}", version_string);
    let license_blurb = "
    This software is provided 'as is', without warranty of any kind.
    Distributed under the MIT OR Apache-2.0 license. Use at your own risk.
    ";
    println!("{}", license_blurb.dimmed());
    println!("{}", rule.dimmed());
}

/// Prints engine events. Pulses are noisy, so they only show when the flag is set.
fn spawn_event_listener(engine: &PulseEngine, show_pulses: Arc<AtomicBool>) {
    let mut events = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                EngineEvent::Pulse { polarity } => {
                    if show_pulses.load(Ordering::Relaxed) {
                        println!("<-- [PULSE] {:?} ({} V)", polarity, polarity.volts());
                    }
                }
                EngineEvent::AnalogueTimeAdvanced { analogue_time } => {
                    println!("<-- [ANALOGUE] {}", analogue_time);
                }
                other => println!("<-- [ENGINE EVENT] {:?}", other),
            }
        }
    });
}

/// The fast clock the shell pretends to be.
struct FastClock {
    status: ClockStatus,
    time: TimeOfDay,
}

impl FastClock {
    fn new(time: TimeOfDay) -> Self {
        let mut status = ClockStatus::running(time.to_string());
        status.is_running = false;
        Self { status, time }
    }

    fn set_time(&mut self, time: TimeOfDay) {
        self.time = time;
        self.status.time = Some(time.to_string());
    }

    fn tick(&mut self) {
        self.set_time(self.time.add_one_minute(HourMode::TwentyFour));
    }
}

fn parse_switch(arg: Option<&&str>) -> Option<bool> {
    match arg.copied() {
        Some("on") => Some(true),
        Some("off") => Some(false),
        _ => None,
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  time <HH:MM>          - Sets the fast clock time and sends it.");
    println!("  tick [N]              - Advances the fast clock N minutes (default 1), one update each.");
    println!("  sync                  - Sends the current fast clock status again.");
    println!("  start | stop          - Starts or stops the fast clock.");
    println!("  pause | resume        - Pauses or resumes the fast clock.");
    println!("  realtime on|off       - Toggles the real-time flag.");
    println!("  unavailable on|off    - Toggles the unavailable flag.");
    println!("  complete              - Stops the clock and marks the session completed.");
    println!("  pulses on|off         - Shows or hides individual pulses.");
    println!("  show                  - Shows the fast clock and analogue clock state.");
    println!("  exit                  - Cleans up the sinks and quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let settings = PulseSettings::load(None)?;
    let restart_time = settings.analogue_start_time()?;
    let sinks: Vec<Arc<dyn Sink>> = vec![
        Arc::new(LoggingSink::new()),
        Arc::new(AnalogueClockSimulationSink::new(restart_time)),
    ];
    let mut engine = PulseEngine::new(settings, sinks, false, restart_time);

    let show_pulses = Arc::new(AtomicBool::new(false));
    spawn_event_listener(&engine, show_pulses.clone());

    let mut clock = FastClock::new(restart_time);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    info!("{} is ready.", ENGINE_NAME.cyan());
    println!(
        "{} is ready. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        let readline = rl.readline(&prompt);
        let line = match readline {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting pulseshell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();
        let Some(command) = args.first() else {
            continue;
        };

        // Commands that change the fast clock fall through to send it.
        match *command {
            "time" => match args.get(1).map(|s| s.parse::<TimeOfDay>()) {
                Some(Ok(time)) => clock.set_time(time),
                Some(Err(e)) => {
                    println!("Error: {}", e);
                    continue;
                }
                None => {
                    println!("Usage: time <HH:MM>");
                    continue;
                }
            },
            "tick" => {
                let count = match args.get(1).map(|s| s.parse::<u32>()) {
                    None => 1,
                    Some(Ok(n)) => n,
                    Some(Err(_)) => {
                        println!("Error: '{}' is not a valid number of minutes.", args[1]);
                        continue;
                    }
                };
                for _ in 0..count {
                    clock.tick();
                    engine.update(clock.status.clone()).await;
                }
                continue;
            }
            "sync" => {}
            "start" => {
                clock.status.is_running = true;
                clock.status.is_completed = false;
            }
            "stop" => clock.status.is_running = false,
            "pause" => clock.status.is_paused = true,
            "resume" => clock.status.is_paused = false,
            "realtime" => match parse_switch(args.get(1)) {
                Some(on) => clock.status.is_realtime = on,
                None => {
                    println!("Usage: realtime on|off");
                    continue;
                }
            },
            "unavailable" => match parse_switch(args.get(1)) {
                Some(on) => clock.status.is_unavailable = on,
                None => {
                    println!("Usage: unavailable on|off");
                    continue;
                }
            },
            "complete" => {
                clock.status.is_running = false;
                clock.status.is_completed = true;
            }
            "pulses" => {
                match parse_switch(args.get(1)) {
                    Some(on) => {
                        show_pulses.store(on, Ordering::Relaxed);
                        println!("--> Pulse display {}.", if on { "on" } else { "off" });
                    }
                    None => println!("Usage: pulses on|off"),
                }
                continue;
            }
            "show" => {
                println!("Fast clock:     {:?}", clock.status);
                println!(
                    "Analogue clock: {} ({:?})",
                    engine.analogue_time().render(engine.hour_mode()),
                    engine.hour_mode()
                );
                match engine.server_time() {
                    Some(time) => println!("Last server:    {}", time),
                    None => println!("Last server:    none"),
                }
                println!("Persisting:     {}", engine.is_persisting());
                continue;
            }
            "help" => {
                print_help();
                continue;
            }
            "exit" => break,
            _ => {
                println!("Unknown command: '{}'. Type 'help'.", line.trim());
                continue;
            }
        }
        engine.update(clock.status.clone()).await;
    }

    engine.shutdown().await;
    Ok(())
}
