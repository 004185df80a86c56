//! procrelay - supervisor event relay
//!
//! Relays process-lifecycle events (log lines, errors, exceptions, kills,
//! restarts) from a process supervisor's bus to chat webhooks, without
//! flooding the channel.
//!
//! # Core Concepts
//!
//! - **Coalescing**: same-kind messages arriving within a short window are
//!   merged into one notification
//! - **Suppression**: when the queue overflows, one notice is sent and the
//!   excess is dropped for a cooldown period
//! - **Periodic drain**: one notification leaves the queue per tick
//! - **Memory only**: nothing survives a restart
//!
//! # Modules
//!
//! - [`source`] - supervisor bus adapters ([`EventSource`])
//! - [`normalizer`] - raw event to [`QueuedMessage`]
//! - [`relay`] - queue, coalescer, suppression guard, drain loop
//! - [`dispatch`] - webhook payloads, transport and paste sink
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod normalizer;
pub mod relay;
pub mod source;

pub use config::{Config, EventSettings, PasteConfig, RelayConfig};
pub use dispatch::{
    DispatchOutcome, Dispatcher, HttpPasteSink, HttpTransport, PasteSink, TransportResponse, WebhookPayload,
    WebhookTransport,
};
pub use domain::{EventKind, QueuedMessage};
pub use error::RelayError;
pub use normalizer::EventNormalizer;
pub use relay::{DrainLoop, MessageQueue, RelayState, SuppressionState, TickOutcome};
pub use source::{BusPacket, BusRecord, EventSource, JsonLinesSource, RawEvent, SupervisorBus};
