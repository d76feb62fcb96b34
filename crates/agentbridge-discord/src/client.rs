//! Discord REST client for one channel

use crate::store::{MessageStore, StoreError, StoreResult, MAX_PAGE_SIZE};
use agentbridge_core::{BridgeConfig, Message, MessageId};
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

const DISCORD_API_URL: &str = "https://discord.com/api/v10";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DiscordClient {
    client: Client,
    token: String,
    channel_id: String,
    base_url: String,
}

#[derive(Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_reference: Option<Reference<'a>>,
}

#[derive(Serialize)]
struct Reference<'a> {
    message_id: &'a str,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            token: token.into(),
            channel_id: channel_id.into(),
            base_url: DISCORD_API_URL.to_string(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(&config.token, &config.channel_id).with_base_url(&config.api_base)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.base_url, self.channel_id)
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

/// Turn a non-success response into `RequestFailed`, keeping the body.
async fn check(response: Response, op: &str) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!("Discord {} error {}: {}", op, status, body);
    Err(StoreError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> StoreResult<T> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

#[async_trait::async_trait]
impl MessageStore for DiscordClient {
    fn name(&self) -> &str {
        "discord"
    }

    async fn list(&self, limit: usize, after: Option<&MessageId>) -> StoreResult<Vec<Message>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let mut query = vec![("limit", limit.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        debug!(channel = %self.channel_id, limit, after = ?after, "listing messages");

        let response = self
            .client
            .get(self.messages_url())
            .header("Authorization", self.auth_header())
            .query(&query)
            .send()
            .await?;
        parse(check(response, "list").await?).await
    }

    async fn create(&self, content: &str, reply_to: Option<&MessageId>) -> StoreResult<Message> {
        let body = CreateMessage {
            content,
            message_reference: reply_to.map(|id| Reference {
                message_id: id.as_str(),
            }),
        };
        debug!(channel = %self.channel_id, reply_to = ?reply_to, "creating message");

        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        parse(check(response, "create").await?).await
    }

    async fn delete(&self, message_id: &MessageId) -> StoreResult<()> {
        debug!(channel = %self.channel_id, %message_id, "deleting message");
        let response = self
            .client
            .delete(format!("{}/{}", self.messages_url(), message_id))
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        check(response, "delete").await.map(|_| ())
    }
}
