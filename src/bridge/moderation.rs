//! Deleting messages: single ids and sweeps of the bridge's own recent posts.

use super::filter::AccessFilter;
use super::reader::ChannelReader;
use super::tracker::RECENT_PAGE_SIZE;
use agentbridge_core::config::ENV_OWN_ID;
use agentbridge_core::{Error, MessageId, Result};
use agentbridge_discord::MessageStore;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<MessageId>,
    pub failed: Vec<MessageId>,
}

#[derive(Clone)]
pub struct Moderator {
    store: Arc<dyn MessageStore>,
    reader: ChannelReader,
    filter: Arc<AccessFilter>,
}

impl Moderator {
    pub fn new(store: Arc<dyn MessageStore>, reader: ChannelReader, filter: Arc<AccessFilter>) -> Self {
        Self {
            store,
            reader,
            filter,
        }
    }

    pub async fn delete(&self, message_id: &MessageId) -> Result<()> {
        self.store.delete(message_id).await.map_err(|e| {
            warn!(%message_id, error = %e, "delete failed");
            Error::delete(message_id.as_str(), e.status(), e.body())
        })?;
        info!(%message_id, "message deleted");
        Ok(())
    }

    /// Delete up to `count` of the bridge's newest messages from the latest
    /// page. Individual failures are collected, not fatal.
    pub async fn cleanup_own(&self, count: usize) -> Result<CleanupReport> {
        if self.filter.own_id().is_none() {
            return Err(Error::config(format!(
                "{ENV_OWN_ID} not set, cannot identify bot messages"
            )));
        }

        let page = self.reader.fetch(RECENT_PAGE_SIZE, None).await?;
        let targets: Vec<MessageId> = page
            .iter()
            .rev()
            .filter(|m| self.filter.is_own(m))
            .take(count)
            .map(|m| m.id.clone())
            .collect();

        let mut report = CleanupReport::default();
        for id in targets {
            match self.delete(&id).await {
                Ok(()) => report.deleted.push(id),
                Err(_) => report.failed.push(id),
            }
        }
        Ok(report)
    }
}
