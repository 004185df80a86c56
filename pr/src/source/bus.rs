//! In-process supervisor bus
//!
//! A tokio broadcast channel carrying [`BusRecord`]s. Supervisor glue publishes
//! packets by stream name; the relay holds a [`BusSource`] subscription.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::{BusPacket, BusRecord, EventSource, RawEvent};

/// Default channel capacity (records)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Broadcast bus for supervisor packets
pub struct SupervisorBus {
    tx: broadcast::Sender<BusRecord>,
}

impl SupervisorBus {
    /// Create a new bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "SupervisorBus::new: creating bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Publish a packet on a named stream
    ///
    /// Fire-and-forget: with no subscribers the packet is dropped.
    pub fn publish(&self, stream: impl Into<String>, packet: BusPacket) {
        let stream = stream.into();
        debug!(%stream, "SupervisorBus::publish");
        let _ = self.tx.send(BusRecord { stream, packet });
    }

    /// Subscribe to a set of streams
    ///
    /// Packets on other streams are discarded by the returned source.
    pub fn subscribe(&self, streams: &[&str]) -> BusSource {
        debug!(?streams, "SupervisorBus::subscribe: new subscriber");
        BusSource {
            rx: self.tx.subscribe(),
            streams: streams.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SupervisorBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Subscription to a [`SupervisorBus`]
pub struct BusSource {
    rx: broadcast::Receiver<BusRecord>,
    streams: Vec<String>,
}

#[async_trait]
impl EventSource for BusSource {
    async fn next_event(&mut self) -> Option<RawEvent> {
        loop {
            match self.rx.recv().await {
                Ok(record) => {
                    if !self.streams.iter().any(|s| *s == record.stream) {
                        debug!(stream = %record.stream, "BusSource::next_event: not subscribed, skipping");
                        continue;
                    }
                    if let Some(event) = RawEvent::from_bus(&record.stream, record.packet) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "BusSource::next_event: lagged behind bus, packets lost");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("BusSource::next_event: bus closed");
                    return None;
                }
            }
        }
    }
}
