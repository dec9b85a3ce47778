//! Broadcasts pulses and clock state as single-byte UDP datagrams.
//!
//! | byte | meaning |
//! |------|---------|
//! | `+`  | positive voltage |
//! | `-`  | negative voltage, and clock stopped |
//! | `_`  | zero voltage |
//! | `\|` | clock started |
//! | `X`  | session completed |

use crate::components::capability::{ControlSink, PulseSink, Sink, StatusSink};
use crate::time::TimeOfDay;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::net::UdpSocket;
use tracing::info;

const POSITIVE: &[u8] = b"+";
const NEGATIVE: &[u8] = b"-";
const ZERO: &[u8] = b"_";
const STARTED: &[u8] = b"|";
const STOPPED: &[u8] = b"-";
const COMPLETED: &[u8] = b"X";

/// Sends every pulse and status change to a broadcast endpoint.
///
/// The socket is bound in `initialize` and dropped in `release`.
#[derive(Debug)]
pub struct UdpBroadcastSink {
    endpoint: SocketAddr,
    socket: Mutex<Option<Arc<UdpSocket>>>,
}

impl UdpBroadcastSink {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            socket: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<UdpSocket>>> {
        self.socket.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn send(&self, message: &[u8]) -> anyhow::Result<()> {
        let socket = self
            .slot()
            .clone()
            .ok_or_else(|| anyhow!("UDP broadcast to {} is not initialized", self.endpoint))?;
        socket
            .send_to(message, self.endpoint)
            .await
            .with_context(|| format!("UDP broadcast to {} failed", self.endpoint))?;
        Ok(())
    }
}

#[async_trait]
impl PulseSink for UdpBroadcastSink {
    async fn positive_voltage(&self) -> anyhow::Result<()> {
        self.send(POSITIVE).await
    }

    async fn negative_voltage(&self) -> anyhow::Result<()> {
        self.send(NEGATIVE).await
    }

    async fn zero_voltage(&self) -> anyhow::Result<()> {
        self.send(ZERO).await
    }
}

#[async_trait]
impl ControlSink for UdpBroadcastSink {
    async fn initialize(&self, _analogue_start_time: TimeOfDay) -> anyhow::Result<()> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .await
            .context("failed to bind UDP broadcast socket")?;
        socket
            .set_broadcast(true)
            .context("failed to enable UDP broadcast")?;
        *self.slot() = Some(Arc::new(socket));
        info!("UDP broadcast started on {}.", self.endpoint);
        Ok(())
    }

    async fn cleanup(&self) -> anyhow::Result<()> {
        info!("UDP broadcast stopped on {}.", self.endpoint);
        Ok(())
    }
}

#[async_trait]
impl StatusSink for UdpBroadcastSink {
    async fn clock_started(&self) -> anyhow::Result<()> {
        self.send(STARTED).await
    }

    async fn clock_stopped(&self) -> anyhow::Result<()> {
        self.send(STOPPED).await
    }

    async fn session_completed(&self) -> anyhow::Result<()> {
        self.send(COMPLETED).await
    }
}

impl Sink for UdpBroadcastSink {
    fn name(&self) -> &str {
        "udp broadcast"
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

    fn release(&self) -> anyhow::Result<()> {
        self.slot().take();
        Ok(())
    }
}
