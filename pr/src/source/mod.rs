//! Supervisor event sources
//!
//! The relay never talks to the supervisor directly. Anything that can yield
//! [`RawEvent`]s implements [`EventSource`]; the drain loop pulls from it.
//!
//! # Bus streams
//!
//! ```text
//! log:out            -> log
//! log:err            -> error
//! process:exception  -> exception
//! pm2:kill           -> kill       (description from `msg`)
//! process:event      -> <event>    (restart, stop, online, exit, ...)
//! ```

mod bus;
mod jsonl;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::RelayConfig;
use crate::domain::EventKind;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, BusSource, SupervisorBus};
pub use jsonl::JsonLinesSource;

pub const STREAM_LOG_OUT: &str = "log:out";
pub const STREAM_LOG_ERR: &str = "log:err";
pub const STREAM_EXCEPTION: &str = "process:exception";
pub const STREAM_KILL: &str = "pm2:kill";
pub const STREAM_PROCESS_EVENT: &str = "process:event";

/// Process name used when a packet carries no process (e.g. kill)
pub const SUPERVISOR_NAME: &str = "PM2";

/// Producer capability: yields raw supervisor events
#[async_trait]
pub trait EventSource: Send {
    /// Next event, or None once the source is closed
    async fn next_event(&mut self) -> Option<RawEvent>;
}

/// Process identity attached to a bus packet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub name: String,
}

/// Packet as delivered on a supervisor bus stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusPacket {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,

    /// Log text or structured payload
    pub data: Value,

    /// Human message (kill events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,

    /// Lifecycle event name (process:event)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

/// A packet tagged with the stream it arrived on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRecord {
    pub stream: String,
    pub packet: BusPacket,
}

/// Supervisor event before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub process_name: String,
    pub kind: EventKind,
    pub payload: Value,
    /// Replaces the payload-derived description when set
    pub description: Option<String>,
}

impl RawEvent {
    pub fn new(process_name: impl Into<String>, kind: EventKind, payload: Value) -> Self {
        Self {
            process_name: process_name.into(),
            kind,
            payload,
            description: None,
        }
    }

    /// Map a bus stream packet to a raw event
    ///
    /// Returns None for unknown streams and lifecycle packets without an event name.
    pub fn from_bus(stream: &str, packet: BusPacket) -> Option<Self> {
        debug!(%stream, "RawEvent::from_bus: called");
        let process_name = packet
            .process
            .map(|p| p.name)
            .unwrap_or_else(|| SUPERVISOR_NAME.to_string());

        match stream {
            STREAM_LOG_OUT => Some(Self::new(process_name, EventKind::Log, packet.data)),
            STREAM_LOG_ERR => Some(Self::new(process_name, EventKind::Error, packet.data)),
            STREAM_EXCEPTION => Some(Self::new(process_name, EventKind::Exception, packet.data)),
            STREAM_KILL => {
                let payload = packet.msg.map(Value::String).unwrap_or(packet.data);
                Some(Self::new(process_name, EventKind::Kill, payload))
            }
            STREAM_PROCESS_EVENT => {
                let event = packet.event?;
                let description = format!(
                    "The following event has occurred on the PM2 process {}: {}",
                    process_name, event
                );
                Some(Self {
                    process_name,
                    kind: EventKind::from(event.as_str()),
                    payload: packet.data,
                    description: Some(description),
                })
            }
            _ => {
                debug!(%stream, "RawEvent::from_bus: unknown stream, ignoring");
                None
            }
        }
    }
}

/// Streams worth subscribing to given the per-kind toggles
pub fn subscribed_streams(relay: &RelayConfig) -> Vec<&'static str> {
    let mut streams = Vec::new();
    if relay.is_enabled(&EventKind::Log) {
        streams.push(STREAM_LOG_OUT);
    }
    if relay.is_enabled(&EventKind::Error) {
        streams.push(STREAM_LOG_ERR);
    }
    if relay.is_enabled(&EventKind::Exception) {
        streams.push(STREAM_EXCEPTION);
    }
    if relay.is_enabled(&EventKind::Kill) {
        streams.push(STREAM_KILL);
    }

    let lifecycle = [
        EventKind::Restart,
        EventKind::RestartOverlimit,
        EventKind::Delete,
        EventKind::Stop,
        EventKind::Exit,
        EventKind::Start,
        EventKind::Online,
    ];
    let any_custom = relay
        .events
        .iter()
        .any(|(kind, settings)| matches!(kind, EventKind::Other(_)) && settings.enabled == Some(true));
    if any_custom || lifecycle.iter().any(|k| relay.is_enabled(k)) {
        streams.push(STREAM_PROCESS_EVENT);
    }

    debug!(?streams, "subscribed_streams: resolved");
    streams
}
