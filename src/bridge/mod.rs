//! The message bridge: cursors, filtering, rate-limited sends.
//!
//! [`Bridge`] wires the components together from one [`BridgeConfig`] and
//! hands out the reader, tracker, send gate and watch loop sharing the same
//! store, cursors and clock.

pub mod clock;
pub mod cursor;
pub mod filter;
pub mod gate;
pub mod moderation;
pub mod reader;
pub mod tracker;
pub mod trigger;
pub mod watch;

use agentbridge_core::BridgeConfig;
use agentbridge_discord::{DiscordClient, MessageStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use clock::{Clock, SystemClock};
use cursor::{CursorStore, FileCursorStore};
use filter::AccessFilter;
use gate::SendGate;
use moderation::Moderator;
use reader::ChannelReader;
use tracker::InteractionTracker;
use trigger::TriggerFile;
use watch::WatchLoop;

pub struct Bridge {
    config: Arc<BridgeConfig>,
    store: Arc<dyn MessageStore>,
    cursors: Arc<dyn CursorStore>,
    clock: Arc<dyn Clock>,
    filter: Arc<AccessFilter>,
}

impl Bridge {
    pub fn new(
        config: BridgeConfig,
        store: Arc<dyn MessageStore>,
        cursors: Arc<dyn CursorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if config.own_id.is_none() {
            warn!("own identity not configured: the bridge's own messages will show up in results");
        }
        let filter = Arc::new(AccessFilter::from_config(&config));
        Self {
            config: Arc::new(config),
            store,
            cursors,
            clock,
            filter,
        }
    }

    /// Discord client, file cursors under the state directory, system clock.
    pub fn from_config(config: BridgeConfig) -> Self {
        let store = Arc::new(DiscordClient::from_config(&config));
        let cursors = Arc::new(FileCursorStore::new(config.state_dir.clone()));
        Self::new(config, store, cursors, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn filter(&self) -> &AccessFilter {
        &self.filter
    }

    pub fn reader(&self) -> ChannelReader {
        ChannelReader::new(self.store.clone())
    }

    pub fn tracker(&self) -> InteractionTracker {
        InteractionTracker::new(
            self.reader(),
            self.filter.clone(),
            self.cursors.clone(),
            self.clock.clone(),
        )
    }

    pub fn gate(&self) -> SendGate {
        SendGate::new(
            self.store.clone(),
            self.cursors.clone(),
            self.clock.clone(),
            self.config.rate_limit,
        )
    }

    pub fn moderator(&self) -> Moderator {
        Moderator::new(self.store.clone(), self.reader(), self.filter.clone())
    }

    /// Watch loop over the unread cursor, writing the configured trigger file.
    pub fn watcher(&self, interval: Duration) -> WatchLoop {
        WatchLoop::new(
            self.tracker(),
            self.filter.clone(),
            self.config.page_size,
            interval,
        )
        .with_trigger(TriggerFile::new(self.config.trigger_file.clone()))
    }
}
