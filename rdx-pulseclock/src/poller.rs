//! Polls the fast clock and feeds each snapshot to the engine.

use crate::config::PulseSettings;
use crate::engine::PulseEngine;
use crate::status::ClockStatus;
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error};

/// Anything that can produce a fast clock status snapshot.
#[async_trait]
pub trait StatusSource: Send {
    async fn fetch(&mut self) -> anyhow::Result<ClockStatus>;
}

/// Fetches the status as JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    href: String,
}

impl HttpStatusSource {
    pub fn new(href: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            href: href.into(),
        })
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&mut self) -> anyhow::Result<ClockStatus> {
        let status = self
            .client
            .get(&self.href)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.href))?
            .error_for_status()?
            .json::<ClockStatus>()
            .await
            .context("fast clock returned an unreadable status")?;
        Ok(status)
    }
}

/// Drives an engine from a `StatusSource` at a fixed cadence.
pub struct StatusPoller<S> {
    source: S,
    poll_interval: Duration,
    error_retry_delay: Duration,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: S, settings: &PulseSettings) -> Self {
        Self {
            source,
            poll_interval: settings.poll_interval(),
            error_retry_delay: settings.error_retry_delay(),
        }
    }

    /// Fetches one snapshot and hands it to the engine.
    ///
    /// A fetch error is returned without touching the engine.
    pub async fn poll_once(&mut self, engine: &mut PulseEngine) -> anyhow::Result<()> {
        let status = self.source.fetch().await?;
        debug!("Fast clock status: {:?}", status);
        engine.update(status).await;
        Ok(())
    }

    /// Polls forever. Stop it by dropping the future.
    ///
    /// Ticks missed while a fast-forward holds the engine are not replayed.
    pub async fn run(&mut self, engine: &mut PulseEngine) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once(engine).await {
                error!(
                    "Failed to fetch fast clock status: {:#}. Retrying in {:?}.",
                    e, self.error_retry_delay
                );
                sleep(self.error_retry_delay).await;
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedSource {
        script: VecDeque<anyhow::Result<ClockStatus>>,
        fetches: usize,
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch(&mut self) -> anyhow::Result<ClockStatus> {
            self.fetches += 1;
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")))
        }
    }

    fn engine(dir: &tempfile::TempDir) -> PulseEngine {
        let settings = PulseSettings {
            pulse_duration_milliseconds: 100,
            fast_forward_interval_milliseconds: 200,
            analogue_time_file: dir.path().join("analogue_time.txt"),
            ..Default::default()
        };
        PulseEngine::new(settings, Vec::new(), false, "06:00".parse().unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn poll_once_feeds_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(&dir);
        let source = ScriptedSource {
            script: VecDeque::from([Ok(ClockStatus::running("06:01"))]),
            fetches: 0,
        };
        let mut poller = StatusPoller::new(source, engine.settings());

        poller.poll_once(&mut engine).await.unwrap();
        assert_eq!(engine.analogue_time().to_string(), "06:01");
        assert_eq!(poller.source().fetches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_leaves_engine_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(&dir);
        let source = ScriptedSource {
            script: VecDeque::from([Err(anyhow::anyhow!("connection refused"))]),
            fetches: 0,
        };
        let mut poller = StatusPoller::new(source, engine.settings());

        assert!(poller.poll_once(&mut engine).await.is_err());
        assert!(!engine.is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_polling_after_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = engine(&dir);
        let source = ScriptedSource {
            script: VecDeque::from([
                Err(anyhow::anyhow!("timeout")),
                Ok(ClockStatus::running("06:00")),
                Ok(ClockStatus::running("06:01")),
            ]),
            fetches: 0,
        };
        let mut poller = StatusPoller::new(source, engine.settings());

        // 2 s cadence plus one 5 s retry delay fits comfortably in 30 s.
        let _ = tokio::time::timeout(Duration::from_secs(30), poller.run(&mut engine)).await;
        assert_eq!(engine.analogue_time().to_string(), "06:01");
        assert!(poller.source().fetches > 3);
    }
}
