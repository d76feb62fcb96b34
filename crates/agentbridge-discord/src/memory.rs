//! In-process message store with Discord's paging semantics.
//!
//! Used for dry runs and tests: records every create call and can be told to
//! fail the next list/create with a given status.

use crate::store::{MessageStore, StoreError, StoreResult, MAX_PAGE_SIZE};
use agentbridge_core::{Author, Message, MessageId, MessageReference};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

const FIRST_ID: u64 = 1_000_000;

/// A create call as the store received it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    pub content: String,
    pub reply_to: Option<MessageId>,
}

#[derive(Default)]
struct Inner {
    messages: Vec<Message>,
    next_id: u64,
    created: Vec<CreateRequest>,
    list_calls: usize,
    list_failures: VecDeque<(u16, String)>,
    create_failures: VecDeque<(u16, String)>,
}

pub struct MemoryStore {
    own: Author,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// `own` is the author stamped on messages created through the store.
    pub fn new(own: Author) -> Self {
        Self {
            own,
            inner: Mutex::new(Inner {
                next_id: FIRST_ID,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a message from `author` and return its id.
    pub fn post(&self, author: &Author, content: &str, timestamp: DateTime<Utc>) -> MessageId {
        let mut inner = self.lock();
        let id = MessageId::new(inner.next_id.to_string());
        inner.next_id += 1;
        inner.messages.push(Message {
            id: id.clone(),
            author: author.clone(),
            timestamp,
            content: content.to_string(),
            message_reference: None,
        });
        id
    }

    pub fn fail_next_list(&self, status: u16, body: impl Into<String>) {
        self.lock().list_failures.push_back((status, body.into()));
    }

    pub fn fail_next_create(&self, status: u16, body: impl Into<String>) {
        self.lock().create_failures.push_back((status, body.into()));
    }

    /// Every create call that reached the store, failed ones included.
    pub fn created(&self) -> Vec<CreateRequest> {
        self.lock().created.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Current history, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }
}

#[async_trait::async_trait]
impl MessageStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, limit: usize, after: Option<&MessageId>) -> StoreResult<Vec<Message>> {
        let mut inner = self.lock();
        inner.list_calls += 1;
        if let Some((status, body)) = inner.list_failures.pop_front() {
            return Err(StoreError::RequestFailed { status, body });
        }

        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut ordered = inner.messages.clone();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let mut page: Vec<Message> = match after {
            // Discord answers `after` with the messages right after the cursor
            Some(after) => ordered
                .into_iter()
                .filter(|m| m.id > *after)
                .take(limit)
                .collect(),
            None => {
                let skip = ordered.len().saturating_sub(limit);
                ordered.into_iter().skip(skip).collect()
            }
        };
        page.reverse();
        Ok(page)
    }

    async fn create(&self, content: &str, reply_to: Option<&MessageId>) -> StoreResult<Message> {
        let mut inner = self.lock();
        inner.created.push(CreateRequest {
            content: content.to_string(),
            reply_to: reply_to.cloned(),
        });
        if let Some((status, body)) = inner.create_failures.pop_front() {
            return Err(StoreError::RequestFailed { status, body });
        }

        let message = Message {
            id: MessageId::new(inner.next_id.to_string()),
            author: self.own.clone(),
            timestamp: Utc::now(),
            content: content.to_string(),
            message_reference: reply_to.map(|id| MessageReference {
                message_id: id.clone(),
            }),
        };
        inner.next_id += 1;
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn delete(&self, message_id: &MessageId) -> StoreResult<()> {
        let mut inner = self.lock();
        let before = inner.messages.len();
        inner.messages.retain(|m| &m.id != message_id);
        if inner.messages.len() == before {
            return Err(StoreError::RequestFailed {
                status: 404,
                body: r#"{"message": "Unknown Message", "code": 10008}"#.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: &str) -> Author {
        Author {
            id: id.into(),
            username: format!("user{id}"),
            global_name: None,
            bot: false,
        }
    }

    fn store_with(n: usize) -> (MemoryStore, Vec<MessageId>) {
        let store = MemoryStore::new(author("bot"));
        let ids = (0..n)
            .map(|i| store.post(&author("1"), &format!("m{i}"), Utc::now()))
            .collect();
        (store, ids)
    }

    #[tokio::test]
    async fn list_without_cursor_is_newest_first() {
        let (store, ids) = store_with(5);
        let page = store.list(3, None).await.unwrap();
        let got: Vec<&MessageId> = page.iter().map(|m| &m.id).collect();
        assert_eq!(got, vec![&ids[4], &ids[3], &ids[2]]);
    }

    #[tokio::test]
    async fn list_after_takes_the_messages_right_after_the_cursor() {
        let (store, ids) = store_with(6);
        let page = store.list(2, Some(&ids[1])).await.unwrap();
        let got: Vec<&MessageId> = page.iter().map(|m| &m.id).collect();
        assert_eq!(got, vec![&ids[3], &ids[2]]);
    }

    #[tokio::test]
    async fn queued_failures_fire_once() {
        let (store, _) = store_with(1);
        store.fail_next_list(503, "unavailable");
        assert!(store.list(10, None).await.is_err());
        assert_eq!(store.list(10, None).await.unwrap().len(), 1);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn delete_unknown_message_is_404() {
        let (store, _) = store_with(1);
        let err = store.delete(&MessageId::new("1")).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
