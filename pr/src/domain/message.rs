//! Canonical queued message

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::kind::EventKind;

/// Description carried by the overflow notice
pub const SUPPRESSION_NOTICE: &str = "Messages are being suppressed due to rate limiting.";

/// A normalized event waiting in the relay queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    /// Name of the originating process
    pub name: String,

    /// Event kind
    pub kind: EventKind,

    /// Sanitized event text
    pub description: String,

    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl QueuedMessage {
    pub fn new(name: impl Into<String>, kind: EventKind, description: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            timestamp,
        }
    }

    /// Synthetic notice sent once per overflow episode
    pub fn suppression_notice(name: impl Into<String>, timestamp: i64) -> Self {
        Self::new(name, EventKind::Suppressed, SUPPRESSION_NOTICE, timestamp)
    }
}

/// Current wall-clock time truncated to whole seconds
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}
