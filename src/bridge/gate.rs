//! Send gate: minimum interval between successful sends.
//!
//! The window is measured from the `send` cursor, which only moves after the
//! store confirms a send. A failed send therefore leaves the previous window
//! in force.

use super::clock::Clock;
use super::cursor::{decode_instant, encode_instant, CursorStore};
use agentbridge_core::{CursorKey, Error, Message, MessageId, Result};
use agentbridge_discord::MessageStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent(Message),
    /// Still inside the window; nothing was sent and no cursor moved.
    RateLimited { wait: Duration },
}

#[derive(Clone)]
pub struct SendGate {
    store: Arc<dyn MessageStore>,
    cursors: Arc<dyn CursorStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl SendGate {
    pub fn new(
        store: Arc<dyn MessageStore>,
        cursors: Arc<dyn CursorStore>,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            cursors,
            clock,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left in the current window, `None` when a send may go out now.
    pub fn remaining(&self) -> Result<Option<Duration>> {
        if self.interval.is_zero() {
            return Ok(None);
        }
        let Some(raw) = self.cursors.get(CursorKey::Send)? else {
            return Ok(None);
        };
        let Some(last_send) = decode_instant(&raw) else {
            warn!(value = %raw, "ignoring unreadable send cursor");
            return Ok(None);
        };

        let elapsed = (self.clock.now() - last_send)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Ok(self
            .interval
            .checked_sub(elapsed)
            .filter(|left| !left.is_zero()))
    }

    /// Send `content`, as a threaded reply when `reply_to` is given. `force`
    /// skips the window check but still records the send.
    pub async fn send(
        &self,
        content: &str,
        reply_to: Option<&MessageId>,
        force: bool,
    ) -> Result<SendOutcome> {
        if !force {
            if let Some(wait) = self.remaining()? {
                info!(wait_secs = wait.as_secs_f64(), "send rate limited");
                return Ok(SendOutcome::RateLimited { wait });
            }
        }

        let started = self.clock.now();
        let message = self
            .store
            .create(content, reply_to)
            .await
            .map_err(|e| {
                warn!(store = self.store.name(), error = %e, "send failed");
                Error::send(e.status(), e.body())
            })?;

        if let Err(e) = self.cursors.set(CursorKey::Send, &encode_instant(started)) {
            warn!(id = %message.id, error = %e, "message sent but send cursor not recorded");
        }
        info!(id = %message.id, reply_to = ?reply_to, forced = force, "message sent");
        Ok(SendOutcome::Sent(message))
    }
}
