//! The core engine that keeps the analogue clock in step with the fast clock.

use crate::common::Polarity;
use crate::components::capability::Sink;
use crate::components::registry::{DispatchReport, Notification, SinkRegistry};
use crate::config::PulseSettings;
use crate::events::EngineEvent;
use crate::status::ClockStatus;
use crate::store::AnalogueTimeStore;
use crate::time::{HourMode, TimeOfDay};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// The pulse engine.
///
/// The engine owns the analogue time and is driven by a single caller through
/// [`update`](Self::update). Both `update` and [`shutdown`](Self::shutdown)
/// need exclusive access, so calls cannot overlap; a polling loop that awaits
/// each `update` before the next one is all the serialization required.
pub struct PulseEngine {
    settings: Arc<PulseSettings>,
    mode: HourMode,
    sinks: SinkRegistry,
    store: AnalogueTimeStore,
    event_sender: broadcast::Sender<EngineEvent>,
    reset_on_start: bool,
    restart_time: TimeOfDay,
    initialized: bool,
    analogue_time: TimeOfDay,
    server_time: Option<TimeOfDay>,
    previous_status: Option<ClockStatus>,
}

// Core implementation block for internal logic.
impl PulseEngine {
    /// Creates an engine. Nothing is read or sent until the first `update`.
    ///
    /// `restart_time` is used when the persisted record is missing or
    /// unusable. With `reset_on_start` it is used unconditionally and the
    /// record is overwritten where possible.
    pub fn new(
        settings: PulseSettings,
        sinks: impl IntoIterator<Item = Arc<dyn Sink>>,
        reset_on_start: bool,
        restart_time: TimeOfDay,
    ) -> Self {
        let store = AnalogueTimeStore::new(settings.analogue_time_file.clone());
        Self::with_store(settings, sinks, reset_on_start, restart_time, store)
    }

    /// Like [`new`](Self::new), with a store other than `analogue_time_file`.
    pub fn with_store(
        settings: PulseSettings,
        sinks: impl IntoIterator<Item = Arc<dyn Sink>>,
        reset_on_start: bool,
        restart_time: TimeOfDay,
        store: AnalogueTimeStore,
    ) -> Self {
        const CHANNEL_CAPACITY: usize = 256;
        let (event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let mode = settings.hour_mode();
        let restart_time = restart_time.on_dial(mode);

        Self {
            settings: Arc::new(settings),
            mode,
            sinks: SinkRegistry::new(sinks),
            store,
            event_sender,
            reset_on_start,
            restart_time,
            initialized: false,
            analogue_time: restart_time,
            server_time: None,
            previous_status: None,
        }
    }

    #[doc(hidden)]
    async fn initialize(&mut self) {
        self.analogue_time = if self.reset_on_start {
            // The record is not consulted even if the reset cannot be written.
            let was_writable = self.store.is_writable();
            self.store.force_save(self.restart_time, self.mode);
            if was_writable && !self.store.is_writable() {
                self.emit(EngineEvent::PersistenceDisabled);
            }
            self.restart_time
        } else {
            match self.store.load(self.mode) {
                Some(time) => time,
                None => {
                    info!(
                        "Using restart time {} as analogue time.",
                        self.restart_time.render(self.mode)
                    );
                    self.persist(self.restart_time);
                    self.restart_time
                }
            }
        };
        self.initialized = true;

        info!(
            "PulseEngine starting with analogue time {} and {} sink(s): {}",
            self.analogue_time.render(self.mode),
            self.sinks.len(),
            self.sinks.names().join(", ")
        );
        self.notify(Notification::Initialize(self.analogue_time)).await;
        self.emit(EngineEvent::Initialized {
            analogue_time: self.analogue_time,
        });
    }

    #[doc(hidden)]
    async fn detect_edges(&mut self, status: &ClockStatus) {
        let previous = self.previous_status.as_ref();
        let stopped = status.was_stopped(previous);
        let started = status.was_started(previous);

        if stopped {
            info!("Fast clock is stopped.");
            self.notify(Notification::ClockStopped).await;
            self.emit(EngineEvent::ClockStopped);
            if status.is_completed {
                sleep(self.settings.session_ended_delay()).await;
                info!("Fast clock session is completed.");
                self.notify(Notification::SessionCompleted).await;
                self.emit(EngineEvent::SessionCompleted);
            }
        } else if started {
            info!("Fast clock is started.");
            self.notify(Notification::ClockStarted).await;
            self.emit(EngineEvent::ClockStarted);
        }
        self.previous_status = Some(status.clone());
    }

    /// Pulses the clock forward one minute from the current analogue time.
    ///
    /// Returns the new time; the caller commits it.
    #[doc(hidden)]
    async fn pulse_and_advance(&mut self) -> TimeOfDay {
        let polarity = Polarity::for_minute(self.analogue_time.minute(), self.settings.flip_polarity);
        self.pulse(polarity).await;
        sleep(self.settings.pulse_duration()).await;
        self.pulse(Polarity::Zero).await;
        sleep(self.settings.zero_voltage_duration()).await;

        let next = self.analogue_time.add_one_minute(self.mode);
        self.persist(next);
        next
    }

    #[doc(hidden)]
    async fn pulse(&self, polarity: Polarity) {
        debug!("Setting {:?} voltage.", polarity);
        self.notify(Notification::for_polarity(polarity)).await;
        self.emit(EngineEvent::Pulse { polarity });
    }

    #[doc(hidden)]
    async fn fast_forward(&mut self, target: TimeOfDay) {
        info!(
            "Fast forwarding analogue time from {} to {}.",
            self.analogue_time.render(self.mode),
            target.render(self.mode)
        );
        self.notify(Notification::FastForwardStarted).await;
        self.emit(EngineEvent::FastForwardStarted {
            from: self.analogue_time,
            to: target,
        });

        let cadence = self.settings.fast_forward_interval();
        let mut ticker = interval_at(Instant::now() + cadence, cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        while !self.analogue_time.is_equal_to(&target, self.mode) {
            ticker.tick().await;
            let next = self.pulse_and_advance().await;
            self.commit(next);
        }

        self.notify(Notification::FastForwardStopped).await;
        self.emit(EngineEvent::FastForwardStopped {
            analogue_time: self.analogue_time,
        });
    }

    #[doc(hidden)]
    fn commit(&mut self, time: TimeOfDay) {
        self.analogue_time = time;
        info!("Analogue time: {}", time.render(self.mode));
        self.emit(EngineEvent::AnalogueTimeAdvanced {
            analogue_time: time,
        });
    }

    #[doc(hidden)]
    fn persist(&mut self, time: TimeOfDay) {
        let was_writable = self.store.is_writable();
        self.store.save(time, self.mode);
        if was_writable && !self.store.is_writable() {
            self.emit(EngineEvent::PersistenceDisabled);
        }
    }

    #[doc(hidden)]
    async fn notify(&self, notification: Notification) -> DispatchReport {
        self.sinks.dispatch(notification).await
    }

    #[doc(hidden)]
    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        self.event_sender.send(event).ok();
    }
}

// Public API implementation block.
impl PulseEngine {
    /// Processes one status snapshot from the fast clock.
    ///
    /// Returns once the analogue clock has caught up with the snapshot's time,
    /// which during a fast-forward can take a long while. Failures of sinks or
    /// of persistence are logged and never surface here.
    pub async fn update(&mut self, status: ClockStatus) {
        if !self.initialized {
            self.initialize().await;
        }

        self.detect_edges(&status).await;
        if status.inhibits_movement() {
            debug!("Analogue clock parked at {}.", self.analogue_time.render(self.mode));
            return;
        }

        let server_time = match TimeOfDay::parse(status.time.as_deref(), self.mode) {
            Ok(time) => time,
            Err(e) => {
                warn!("Ignoring fast clock status with unusable time: {}", e);
                return;
            }
        };
        self.server_time = Some(server_time);

        if self.analogue_time.is_equal_to(&server_time, self.mode) {
            return;
        }
        if self.analogue_time.is_one_minute_after(&server_time, self.mode) {
            let next = self.pulse_and_advance().await;
            self.commit(next);
        } else {
            self.fast_forward(server_time).await;
        }
    }

    /// Cleans up every control sink, then releases sink resources.
    ///
    /// Consumes the engine, so it runs at most once.
    pub async fn shutdown(self) {
        info!("Shutting down PulseEngine...");
        self.notify(Notification::Cleanup).await;
        self.sinks.release_all();
        self.emit(EngineEvent::EngineShutdown);
        info!(
            "PulseEngine has shut down with analogue time {}.",
            self.analogue_time.render(self.mode)
        );
    }

    /// Subscribes to the `EngineEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    /// Where the engine believes the hands are.
    pub fn analogue_time(&self) -> TimeOfDay {
        self.analogue_time
    }

    /// The last usable time reported by the fast clock.
    pub fn server_time(&self) -> Option<TimeOfDay> {
        self.server_time
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_persisting(&self) -> bool {
        self.store.is_writable()
    }

    pub fn hour_mode(&self) -> HourMode {
        self.mode
    }

    pub fn settings(&self) -> &PulseSettings {
        &self.settings
    }
}
