//! Watch loop: poll unread, hand the batch to a sink, sleep, repeat.
//!
//! One poll at a time; the sleep is the only suspension point. Fetch errors
//! go to the sink and the loop carries on with the next tick.

use super::filter::AccessFilter;
use super::tracker::{InteractionTracker, PollRequest};
use super::trigger::TriggerFile;
use agentbridge_core::{Error, FilteredMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(30);

/// Receives the output of each tick.
pub trait WatchSink {
    fn messages(&mut self, batch: &[FilteredMessage]);
    fn error(&mut self, error: &Error);
}

pub struct WatchLoop {
    tracker: InteractionTracker,
    filter: Arc<AccessFilter>,
    request: PollRequest,
    interval: Duration,
    trigger: Option<TriggerFile>,
}

impl WatchLoop {
    pub fn new(
        tracker: InteractionTracker,
        filter: Arc<AccessFilter>,
        page_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            tracker,
            filter,
            request: PollRequest::unread(page_size),
            interval,
            trigger: None,
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerFile) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One poll cycle. Returns how many messages were delivered.
    pub async fn tick(&self, sink: &mut dyn WatchSink) -> usize {
        let batch = match self.tracker.poll(&self.request).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "watch tick failed");
                sink.error(&e);
                return 0;
            }
        };
        if batch.is_empty() {
            return 0;
        }

        if let Some(trigger) = &self.trigger {
            let latest_permitted = batch
                .iter()
                .rev()
                .find(|m| self.filter.is_allowed(&m.author_id));
            if let Some(message) = latest_permitted {
                if let Err(e) = trigger.write(&message.content) {
                    warn!(path = %trigger.path().display(), error = %e, "trigger write failed");
                    sink.error(&Error::IoError(e));
                }
            }
        }

        sink.messages(&batch);
        batch.len()
    }

    /// Tick until cancelled. Returns the number of completed ticks.
    pub async fn run(&self, sink: &mut dyn WatchSink, cancel: CancellationToken) -> u64 {
        info!(interval_secs = self.interval.as_secs(), "watch started");
        let mut ticks = 0u64;
        while !cancel.is_cancelled() {
            self.tick(sink).await;
            ticks += 1;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!(ticks, "watch stopped");
        ticks
    }
}
