//! Drain loop: intake plus periodic ticks

use std::sync::Arc;

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::config::RelayConfig;
use crate::dispatch::Dispatcher;
use crate::domain::{QueuedMessage, now_secs};
use crate::normalizer::EventNormalizer;
use crate::source::{EventSource, RawEvent};

use super::state::{RelayState, TickOutcome};

/// Single worker alternating between accepting events and draining ticks
///
/// Owns the queue and suppression state outright; nothing else touches them,
/// so no locking is involved. Dispatches are spawned and not awaited.
pub struct DrainLoop<S: EventSource> {
    config: Arc<RelayConfig>,
    normalizer: EventNormalizer,
    dispatcher: Arc<Dispatcher>,
    source: S,
    state: RelayState,
}

impl<S: EventSource> DrainLoop<S> {
    pub fn new(config: Arc<RelayConfig>, dispatcher: Arc<Dispatcher>, source: S) -> Self {
        debug!(?config, "DrainLoop::new: called");
        Self {
            normalizer: EventNormalizer::new(config.clone()),
            config,
            dispatcher,
            source,
            state: RelayState::new(),
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Normalize and enqueue; returns whether the event was kept
    pub fn accept(&mut self, event: RawEvent) -> bool {
        match self.normalizer.normalize(event) {
            Some(msg) => {
                self.state.push(msg);
                true
            }
            None => false,
        }
    }

    /// Run one tick at `now` and spawn dispatch of whatever it produced
    pub fn tick_at(&mut self, now: i64) -> TickOutcome {
        let outcome = self.state.tick(&self.config, now);
        for msg in outcome.clone().outgoing() {
            self.spawn_dispatch(msg);
        }
        outcome
    }

    fn spawn_dispatch(&self, msg: QueuedMessage) {
        debug!(name = %msg.name, kind = %msg.kind, "DrainLoop::spawn_dispatch: called");
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            dispatcher.send(&msg).await;
        });
    }

    /// Run until the process stops
    ///
    /// The tick period is measured from the end of one tick to the start of
    /// the next. A closed source stops intake but ticks keep draining.
    pub async fn run(mut self) {
        let interval = self.config.tick_interval();
        info!(?interval, queue_max = self.config.queue_max, "Relay drain loop started");

        let mut source_open = true;
        let next_tick = sleep(interval);
        tokio::pin!(next_tick);

        loop {
            tokio::select! {
                event = self.source.next_event(), if source_open => {
                    match event {
                        Some(event) => {
                            self.accept(event);
                        }
                        None => {
                            info!("Event source closed, draining remaining messages");
                            source_open = false;
                        }
                    }
                }
                () = &mut next_tick => {
                    self.tick_at(now_secs());
                    next_tick.as_mut().reset(Instant::now() + interval);
                }
            }
        }
    }
}
