//! Agentbridge Discord - channel message store over the Discord REST API

pub mod client;
pub mod memory;
pub mod store;

pub use client::DiscordClient;
pub use memory::{CreateRequest, MemoryStore};
pub use store::{MessageStore, StoreError, StoreResult, MAX_PAGE_SIZE};
