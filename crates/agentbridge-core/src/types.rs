//! Core types for Agentbridge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Message identifier - a Discord snowflake, cheaply cloneable.
///
/// Snowflakes are decimal strings, so ordering compares length first and
/// then the digits: "999" is older than "1000".
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Arc<str>);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Ord for MessageId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for MessageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Message author as the chat platform reports it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl Author {
    /// The name the platform shows: global display name, else username.
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Threaded reference from a reply to the message it answers
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageReference {
    pub message_id: MessageId,
}

/// A channel message (read-only from the bridge's point of view)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

/// A message that survived self-exclusion and the allow-list.
///
/// Serialises as `{id, author, author_id, content, timestamp}` with the
/// timestamp cut to the minute (`2024-05-01 12:30`).
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FilteredMessage {
    pub id: MessageId,
    /// Display label: allow-list name, else the platform display name
    pub author: String,
    pub author_id: String,
    /// Author is a bot account
    #[serde(skip_serializing)]
    pub bot: bool,
    pub content: String,
    #[serde(serialize_with = "minute_timestamp")]
    pub timestamp: DateTime<Utc>,
}

fn minute_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&ts.format("%Y-%m-%d %H:%M"))
}

/// The three independently tracked cursors
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorKey {
    /// Last message seen by `read`/`unread`/`watch`
    Read,
    /// Last message seen by `interactions`
    Interaction,
    /// Instant of the last successful send or reply
    Send,
}

impl CursorKey {
    pub const ALL: [CursorKey; 3] = [CursorKey::Read, CursorKey::Interaction, CursorKey::Send];

    /// Stable storage name for this cursor
    pub fn storage_name(&self) -> &'static str {
        match self {
            Self::Read => "last_read",
            Self::Interaction => "last_interaction",
            Self::Send => "last_send",
        }
    }
}

impl std::fmt::Display for CursorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.storage_name())
    }
}

/// Authors permitted to interact, with their configured display names.
///
/// Insertion order is kept so listings match the configuration. An empty
/// list permits everyone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: Vec<(String, String)>,
}

impl AllowList {
    /// Parse `"id1:Name1,id2:Name2"`. Pairs without a `:` are skipped and a
    /// repeated id keeps its last name.
    pub fn parse(raw: &str) -> Self {
        let mut list = Self::default();
        for pair in raw.split(',') {
            let pair = pair.trim();
            if let Some((id, name)) = pair.split_once(':') {
                list.insert(id.trim(), name.trim());
            }
        }
        list
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = name,
            None => self.entries.push((id, name)),
        }
    }

    pub fn name_of(&self, author_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == author_id)
            .map(|(_, name)| name.as_str())
    }

    pub fn contains(&self, author_id: &str) -> bool {
        self.name_of(author_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

impl<I, N> FromIterator<(I, N)> for AllowList
where
    I: Into<String>,
    N: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (I, N)>>(iter: T) -> Self {
        let mut list = Self::default();
        for (id, name) in iter {
            list.insert(id, name);
        }
        list
    }
}
