//! Relay core: queue, coalescing, overflow suppression and the drain loop
//!
//! ```text
//! EventSource -> EventNormalizer -> MessageQueue
//!                                       |
//!                         every tick:   v
//!                   drain_one (coalesce) -> Dispatcher
//!                   SuppressionState     -> Dispatcher (notice) + truncate
//! ```

mod drain;
mod queue;
mod state;
mod suppression;

pub use drain::DrainLoop;
pub use queue::MessageQueue;
pub use state::{RelayState, RelayStats, TickOutcome};
pub use suppression::{GuardOutcome, SUPPRESSION_COOLDOWN_SECS, SuppressionState};
