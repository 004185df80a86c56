//! Overflow suppression
//!
//! When the queue outgrows its cap the guard sends one notice, trims the queue
//! back to the cap and stays active for a fixed cooldown. Further overflow
//! during the cooldown is trimmed silently.

use tracing::{debug, info};

use crate::domain::QueuedMessage;

use super::queue::MessageQueue;

/// Seconds an overflow episode lasts before the notice can fire again
pub const SUPPRESSION_COOLDOWN_SECS: i64 = 60;

/// Overflow episode tracking; `activated_at` is set only while active
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuppressionState {
    activated_at: Option<i64>,
}

/// What one enforcement step did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GuardOutcome {
    /// Notice to dispatch, set only on the tick an episode starts
    pub notice: Option<QueuedMessage>,
    /// Entries discarded past the cap
    pub dropped: usize,
    /// The cooldown elapsed and the episode ended this tick
    pub cleared: bool,
}

impl SuppressionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.activated_at.is_some()
    }

    pub fn activated_at(&self) -> Option<i64> {
        self.activated_at
    }

    /// Run once per tick, after the tick's drain
    ///
    /// `notice_name` is the process name the notice is attributed to.
    pub fn enforce(&mut self, queue: &mut MessageQueue, queue_max: usize, notice_name: &str, now: i64) -> GuardOutcome {
        debug!(len = queue.len(), queue_max, active = self.is_active(), "SuppressionState::enforce: called");
        let mut outcome = GuardOutcome::default();

        if queue.len() > queue_max {
            if self.activated_at.is_none() {
                info!(len = queue.len(), queue_max, "Queue overflow, suppressing messages");
                self.activated_at = Some(now);
                outcome.notice = Some(QueuedMessage::suppression_notice(notice_name, now));
            }
            outcome.dropped = queue.truncate(queue_max);
            debug!(dropped = outcome.dropped, "SuppressionState::enforce: truncated queue");
        }

        if let Some(activated_at) = self.activated_at {
            if now - activated_at >= SUPPRESSION_COOLDOWN_SECS {
                info!(activated_at, now, "Suppression cooldown elapsed, re-arming");
                self.activated_at = None;
                outcome.cleared = true;
            }
        }

        outcome
    }
}
