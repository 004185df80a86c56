//! Domain types shared by every relay stage

mod kind;
mod message;

pub use kind::{DEFAULT_COLOR, EventKind};
pub use message::{QueuedMessage, SUPPRESSION_NOTICE, now_secs};
