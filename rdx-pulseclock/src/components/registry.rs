//! Fans notifications out to the registered sinks.

use crate::common::{Polarity, SinkId};
use crate::components::capability::Sink;
use crate::time::TimeOfDay;
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use slotmap::SlotMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, trace};

/// How long a pulse sink may take per voltage change.
pub const PULSE_BUDGET: Duration = Duration::from_millis(10);
/// How long a control, status or fast-forward call may take.
pub const NOTIFICATION_BUDGET: Duration = Duration::from_millis(100);

/// One call the engine makes on every sink that supports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    PositiveVoltage,
    NegativeVoltage,
    ZeroVoltage,
    Initialize(TimeOfDay),
    Cleanup,
    ClockStarted,
    ClockStopped,
    SessionCompleted,
    FastForwardStarted,
    FastForwardStopped,
}

impl Notification {
    pub fn for_polarity(polarity: Polarity) -> Self {
        match polarity {
            Polarity::Positive => Notification::PositiveVoltage,
            Polarity::Negative => Notification::NegativeVoltage,
            Polarity::Zero => Notification::ZeroVoltage,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Notification::PositiveVoltage => "positive voltage",
            Notification::NegativeVoltage => "negative voltage",
            Notification::ZeroVoltage => "zero voltage",
            Notification::Initialize(_) => "initialize",
            Notification::Cleanup => "cleanup",
            Notification::ClockStarted => "clock started",
            Notification::ClockStopped => "clock stopped",
            Notification::SessionCompleted => "session completed",
            Notification::FastForwardStarted => "fast forward started",
            Notification::FastForwardStopped => "fast forward stopped",
        }
    }

    /// The time a sink has to complete this call before it counts as failed.
    pub fn budget(&self) -> Duration {
        match self {
            Notification::PositiveVoltage
            | Notification::NegativeVoltage
            | Notification::ZeroVoltage => PULSE_BUDGET,
            _ => NOTIFICATION_BUDGET,
        }
    }

    /// Starts the call on `sink`, or returns `None` if the sink lacks the
    /// capability.
    fn invoke<'a>(&self, sink: &'a dyn Sink) -> Option<BoxFuture<'a, anyhow::Result<()>>> {
        match *self {
            Notification::PositiveVoltage => sink.as_pulse().map(|s| s.positive_voltage()),
            Notification::NegativeVoltage => sink.as_pulse().map(|s| s.negative_voltage()),
            Notification::ZeroVoltage => sink.as_pulse().map(|s| s.zero_voltage()),
            Notification::Initialize(time) => sink.as_control().map(|s| s.initialize(time)),
            Notification::Cleanup => sink.as_control().map(|s| s.cleanup()),
            Notification::ClockStarted => sink.as_status().map(|s| s.clock_started()),
            Notification::ClockStopped => sink.as_status().map(|s| s.clock_stopped()),
            Notification::SessionCompleted => sink.as_status().map(|s| s.session_completed()),
            Notification::FastForwardStarted => {
                sink.as_fast_forward().map(|s| s.fast_forward_started())
            }
            Notification::FastForwardStopped => {
                sink.as_fast_forward().map(|s| s.fast_forward_stopped())
            }
        }
    }
}

/// The outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sinks that support the notification and were called.
    pub attempted: usize,
    /// Calls that returned an error or panicked.
    pub failed: usize,
}

/// The ordered set of sinks the engine talks to.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: SlotMap<SinkId, Arc<dyn Sink>>,
}

impl SinkRegistry {
    pub fn new(sinks: impl IntoIterator<Item = Arc<dyn Sink>>) -> Self {
        let mut registry = Self::default();
        for sink in sinks {
            registry.register(sink);
        }
        registry
    }

    /// Adds a sink. Sinks are notified in registration order.
    pub fn register(&mut self, sink: Arc<dyn Sink>) -> SinkId {
        self.sinks.insert(sink)
    }

    pub fn get(&self, id: SinkId) -> Option<&Arc<dyn Sink>> {
        self.sinks.get(id)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sinks.values().map(|sink| sink.name()).collect()
    }

    /// Calls every capable sink concurrently and waits for all of them, each
    /// for at most the notification's [`budget`](Notification::budget).
    ///
    /// Errors, panics and overruns are logged per sink; one failing sink never
    /// keeps the others from being called. An overrunning call is dropped.
    pub async fn dispatch(&self, notification: Notification) -> DispatchReport {
        let budget = notification.budget();
        let calls = self.sinks.iter().filter_map(|(id, sink)| {
            let call = notification.invoke(sink.as_ref())?;
            Some(async move {
                let outcome = timeout(budget, AssertUnwindSafe(call).catch_unwind()).await;
                (id, sink, outcome)
            })
        });
        let outcomes = join_all(calls).await;

        let mut report = DispatchReport {
            attempted: outcomes.len(),
            failed: 0,
        };
        for (id, sink, outcome) in outcomes {
            let failure = match outcome {
                Ok(Ok(Ok(()))) => continue,
                Ok(Ok(Err(e))) => format!("{e:#}"),
                Ok(Err(panic)) => format!("panicked: {}", panic_message(panic.as_ref())),
                Err(_) => format!("did not finish within {:?}", budget),
            };
            report.failed += 1;
            error!(
                sink = sink.name(),
                sink_id = ?id,
                "Sink failed during {}: {}",
                notification.label(),
                failure
            );
        }
        trace!(
            "Dispatched {} to {} sink(s), {} failed.",
            notification.label(),
            report.attempted,
            report.failed
        );
        report
    }

    /// Calls `release` on every sink, best effort.
    pub fn release_all(&self) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (id, sink) in self.sinks.iter() {
            report.attempted += 1;
            let failure = match panic::catch_unwind(AssertUnwindSafe(|| sink.release())) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
            };
            report.failed += 1;
            error!(sink = sink.name(), sink_id = ?id, "Sink failed to release resources: {}", failure);
        }
        report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
