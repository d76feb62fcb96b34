//! Error types for Agentbridge

use crate::types::CursorKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("fetch failed: {}", describe(.status, .body))]
    FetchError { status: Option<u16>, body: String },

    #[error("send failed: {}", describe(.status, .body))]
    SendError { status: Option<u16>, body: String },

    #[error("delete of message {message_id} failed: {}", describe(.status, .body))]
    DeleteError {
        message_id: String,
        status: Option<u16>,
        body: String,
    },

    #[error("cursor {key} unavailable: {source}")]
    CursorError {
        key: CursorKey,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn describe(status: &Option<u16>, body: &str) -> String {
    match *status {
        Some(code) if body.is_empty() => format!("{code}"),
        Some(code) => format!("{code} - {body}"),
        None => body.to_string(),
    }
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn fetch(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::FetchError {
            status,
            body: body.into(),
        }
    }

    pub fn send(status: Option<u16>, body: impl Into<String>) -> Self {
        Self::SendError {
            status,
            body: body.into(),
        }
    }

    pub fn delete(message_id: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        Self::DeleteError {
            message_id: message_id.into(),
            status,
            body: body.into(),
        }
    }

    pub fn cursor(key: CursorKey, source: std::io::Error) -> Self {
        Self::CursorError { key, source }
    }

    /// Only missing configuration aborts the process; everything else is
    /// reported and the caller carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }
}
