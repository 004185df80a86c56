//! Message queue and time-window coalescing

use std::collections::VecDeque;

use tracing::debug;

use crate::domain::QueuedMessage;

/// FIFO of normalized messages, arrival order preserved
#[derive(Debug, Default, Clone)]
pub struct MessageQueue {
    entries: VecDeque<QueuedMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the tail; the cap is enforced at drain time, not here
    pub fn enqueue(&mut self, msg: QueuedMessage) {
        debug!(name = %msg.name, kind = %msg.kind, len = self.entries.len(), "MessageQueue::enqueue: called");
        self.entries.push_back(msg);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn front(&self) -> Option<&QueuedMessage> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedMessage> {
        self.entries.iter()
    }

    /// Keep the first `max` entries, returning how many newer ones were dropped
    pub fn truncate(&mut self, max: usize) -> usize {
        let dropped = self.entries.len().saturating_sub(max);
        self.entries.truncate(max);
        dropped
    }

    /// Pop the head and fold in the run of same-kind messages behind it
    ///
    /// With `window` set, consecutive heads of the same kind whose timestamp is
    /// in `[first.timestamp, first.timestamp + window)` are merged, descriptions
    /// newline-joined in arrival order. The run ends at the first head that
    /// doesn't match; nothing past it is examined. Without a window the head
    /// is returned untouched.
    pub fn drain_one(&mut self, window: Option<i64>) -> Option<QueuedMessage> {
        let mut first = self.entries.pop_front()?;
        debug!(kind = %first.kind, timestamp = first.timestamp, ?window, "MessageQueue::drain_one: popped head");

        let Some(window) = window else {
            return Some(first);
        };

        let window_end = first.timestamp + window;
        let mut merged = 0usize;
        while let Some(next) = self.entries.front() {
            let in_run = next.kind == first.kind && next.timestamp >= first.timestamp && next.timestamp < window_end;
            if !in_run {
                break;
            }
            if let Some(next) = self.entries.pop_front() {
                first.description.push('\n');
                first.description.push_str(&next.description);
                merged += 1;
            }
        }

        if merged > 0 {
            debug!(merged, kind = %first.kind, "MessageQueue::drain_one: coalesced run");
        }
        Some(first)
    }
}
