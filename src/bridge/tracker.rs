//! Interaction tracker: new, permitted, non-self messages since the last check.
//!
//! The cursor advances to the newest message the fetch returned, whether or
//! not it survived filtering. Filtered-out messages are "seen" and must not
//! come back on the next poll.

use super::clock::Clock;
use super::cursor::CursorStore;
use super::filter::AccessFilter;
use super::reader::ChannelReader;
use agentbridge_core::{CursorKey, FilteredMessage, Message, MessageId, Result};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

/// Page size when continuing from a cursor.
pub const AFTER_PAGE_SIZE: usize = 50;
/// Page size for `read`, `interactions` and `cleanup` without a cursor.
pub const RECENT_PAGE_SIZE: usize = 50;
/// Page size for the `context` digest.
pub const CONTEXT_PAGE_SIZE: usize = 20;

/// Which authors a poll surfaces (self-exclusion applies to both).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only authors on the allow-list (everyone when it is empty).
    AllowListed,
    /// Every author.
    Everyone,
}

#[derive(Debug, Clone)]
pub struct PollRequest {
    /// Cursor consulted and advanced: `Read` or `Interaction`.
    pub cursor: CursorKey,
    /// Continue after the stored cursor. When false the latest page is read
    /// regardless of it.
    pub since_cursor: bool,
    /// Without a cursor, keep only messages newer than `now - window`.
    pub window: Option<Duration>,
    pub audience: Audience,
    /// Keep the bridge's own messages.
    pub include_own: bool,
    /// Page size used when no cursor is in play.
    pub first_page: usize,
    /// Advance the cursor after a non-empty fetch.
    pub mark_seen: bool,
}

impl PollRequest {
    /// Everything new since the last `unread`/`watch` tick.
    pub fn unread(first_page: usize) -> Self {
        Self {
            cursor: CursorKey::Read,
            since_cursor: true,
            window: None,
            audience: Audience::Everyone,
            include_own: false,
            first_page,
            mark_seen: true,
        }
    }

    /// Allow-listed messages not yet handled by the agent.
    pub fn interactions(window: Option<Duration>) -> Self {
        Self {
            cursor: CursorKey::Interaction,
            since_cursor: true,
            window,
            audience: Audience::AllowListed,
            include_own: false,
            first_page: RECENT_PAGE_SIZE,
            mark_seen: true,
        }
    }

    /// The latest page, optionally windowed; marks it as read.
    pub fn recent(window: Option<Duration>) -> Self {
        Self {
            cursor: CursorKey::Read,
            since_cursor: false,
            window,
            audience: Audience::Everyone,
            include_own: false,
            first_page: RECENT_PAGE_SIZE,
            mark_seen: true,
        }
    }

    /// A short digest of recent conversation. Touches no cursor.
    pub fn context() -> Self {
        Self {
            cursor: CursorKey::Read,
            since_cursor: false,
            window: None,
            audience: Audience::Everyone,
            include_own: false,
            first_page: CONTEXT_PAGE_SIZE,
            mark_seen: false,
        }
    }

    pub fn with_own(mut self, include_own: bool) -> Self {
        self.include_own = include_own;
        self
    }

    pub fn with_marking(mut self, mark_seen: bool) -> Self {
        self.mark_seen = mark_seen;
        self
    }
}

#[derive(Clone)]
pub struct InteractionTracker {
    reader: ChannelReader,
    filter: Arc<AccessFilter>,
    cursors: Arc<dyn CursorStore>,
    clock: Arc<dyn Clock>,
}

impl InteractionTracker {
    pub fn new(
        reader: ChannelReader,
        filter: Arc<AccessFilter>,
        cursors: Arc<dyn CursorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            filter,
            cursors,
            clock,
        }
    }

    /// Fetch, filter and (optionally) mark as seen. Returns the surviving
    /// messages oldest first; a fetch failure leaves the cursor untouched.
    pub async fn poll(&self, request: &PollRequest) -> Result<Vec<FilteredMessage>> {
        let after = if request.since_cursor {
            self.cursors.get(request.cursor)?.map(MessageId::new)
        } else {
            None
        };

        let page = match &after {
            Some(cursor) => self.reader.fetch(AFTER_PAGE_SIZE, Some(cursor)).await?,
            None => self.reader.fetch(request.first_page, None).await?,
        };
        let last_fetched = page.last().map(|m| m.id.clone());
        let fetched = page.len();

        // A window reaching past the representable range keeps everything.
        let cutoff = match (&after, request.window) {
            (None, Some(window)) => self.clock.now().checked_sub_signed(window),
            _ => None,
        };

        let surfaced: Vec<FilteredMessage> = page
            .into_iter()
            .filter(|m| cutoff.map_or(true, |cutoff| m.timestamp > cutoff))
            .filter(|m| request.include_own || !self.filter.is_own(m))
            .filter(|m| match request.audience {
                Audience::AllowListed => self.filter.is_allowed(&m.author.id),
                Audience::Everyone => true,
            })
            .map(|m| self.to_filtered(m))
            .collect();

        if request.mark_seen {
            if let Some(last) = last_fetched {
                self.cursors.set(request.cursor, last.as_str())?;
            }
        }

        if fetched > 0 {
            info!(
                cursor = %request.cursor,
                fetched,
                surfaced = surfaced.len(),
                "poll complete"
            );
        } else {
            debug!(cursor = %request.cursor, "nothing new");
        }
        Ok(surfaced)
    }

    fn to_filtered(&self, message: Message) -> FilteredMessage {
        FilteredMessage {
            author: self.filter.display_label(&message),
            bot: message.author.bot,
            author_id: message.author.id,
            id: message.id,
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}
