//! Relay state owned by the drain loop

use tracing::debug;

use crate::config::RelayConfig;
use crate::domain::QueuedMessage;

use super::queue::MessageQueue;
use super::suppression::SuppressionState;

/// Queue-side counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RelayStats {
    pub total_enqueued: u64,
    pub total_drained: u64,
    pub total_merged: u64,
    pub total_dropped: u64,
    pub suppression_episodes: u64,
    pub peak_queue_depth: usize,
}

/// Messages one tick hands to the dispatcher
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// Head of the queue, coalesced when buffering is on
    pub message: Option<QueuedMessage>,
    /// Overflow notice, bypassing the queue
    pub notice: Option<QueuedMessage>,
    /// Entries discarded past the cap
    pub dropped: usize,
}

impl TickOutcome {
    /// Outgoing messages in dispatch order
    pub fn outgoing(self) -> impl Iterator<Item = QueuedMessage> {
        self.message.into_iter().chain(self.notice)
    }
}

/// Queue plus suppression state, mutated only by the drain loop
#[derive(Debug, Default, Clone)]
pub struct RelayState {
    pub queue: MessageQueue,
    pub suppression: SuppressionState,
    pub stats: RelayStats,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: QueuedMessage) {
        self.queue.enqueue(msg);
        self.stats.total_enqueued += 1;
        self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
    }

    /// One drain step: drain, then suppression check
    ///
    /// Synchronous, so truncation never races a dispatch from the same tick.
    pub fn tick(&mut self, config: &RelayConfig, now: i64) -> TickOutcome {
        debug!(len = self.queue.len(), now, "RelayState::tick: called");
        let before = self.queue.len();
        let message = self.queue.drain_one(config.buffer_window());
        let drained = before - self.queue.len();
        if drained > 0 {
            self.stats.total_drained += drained as u64;
            self.stats.total_merged += (drained - 1) as u64;
        }

        let guard = self.suppression.enforce(&mut self.queue, config.queue_max, &config.name, now);
        if guard.notice.is_some() {
            self.stats.suppression_episodes += 1;
        }
        self.stats.total_dropped += guard.dropped as u64;

        debug!(stats = ?self.stats, remaining = self.queue.len(), "RelayState::tick: done");
        TickOutcome {
            message,
            notice: guard.notice,
            dropped: guard.dropped,
        }
    }
}
