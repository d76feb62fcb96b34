//! Channel reader: one bounded page per call, always oldest first.

use agentbridge_core::{Error, Message, MessageId, Result};
use agentbridge_discord::{MessageStore, MAX_PAGE_SIZE};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct ChannelReader {
    store: Arc<dyn MessageStore>,
}

impl ChannelReader {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Fetch up to `limit` messages (newer than `after` when given) in
    /// chronological order. No pagination: anything beyond one page is left
    /// for the next call.
    pub async fn fetch(&self, limit: usize, after: Option<&MessageId>) -> Result<Vec<Message>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut page = self.store.list(limit, after).await.map_err(|e| {
            warn!(store = self.store.name(), error = %e, "fetch failed");
            Error::fetch(e.status(), e.body())
        })?;
        page.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = page.len(), after = ?after, "fetched page");
        Ok(page)
    }
}
