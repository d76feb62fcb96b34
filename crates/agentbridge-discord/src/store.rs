//! Message store trait

use agentbridge_core::{Message, MessageId};

/// Discord refuses `limit` values above this.
pub const MAX_PAGE_SIZE: usize = 100;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {status} - {body}")]
    RequestFailed { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl StoreError {
    /// HTTP status of the failed call, when the store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::NetworkError(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidResponse(_) => None,
        }
    }

    /// Response body, or a description of what went wrong.
    pub fn body(&self) -> String {
        match self {
            Self::RequestFailed { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// A single channel's message history, addressed by cursor.
///
/// Pages come back newest first, the way Discord returns them, with or
/// without `after`.
#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` messages; only those newer than `after` when given.
    async fn list(&self, limit: usize, after: Option<&MessageId>) -> StoreResult<Vec<Message>>;

    /// Post a message, threaded under `reply_to` when given.
    async fn create(&self, content: &str, reply_to: Option<&MessageId>) -> StoreResult<Message>;

    async fn delete(&self, message_id: &MessageId) -> StoreResult<()>;
}
