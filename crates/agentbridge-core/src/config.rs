//! Bridge configuration
//!
//! Built once at startup from the process environment (optionally seeded
//! from a `.env` file) and handed to every component. Nothing below the CLI
//! reads the environment directly.

use crate::error::{Error, Result};
use crate::types::AllowList;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_TOKEN: &str = "DISCORD_BOT_TOKEN";
pub const ENV_CHANNEL_ID: &str = "DISCORD_CHANNEL_ID";
pub const ENV_OWN_ID: &str = "DISCORD_BOT_ID";
pub const ENV_ALLOWED_USERS: &str = "DISCORD_ALLOWED_USERS";
pub const ENV_RATE_LIMIT: &str = "DISCORD_RATE_LIMIT";
pub const ENV_API_BASE: &str = "DISCORD_API_BASE";
pub const ENV_STATE_DIR: &str = "AGENTBRIDGE_STATE_DIR";
pub const ENV_TRIGGER_FILE: &str = "AGENTBRIDGE_TRIGGER_FILE";
pub const ENV_PAGE_SIZE: &str = "AGENTBRIDGE_PAGE_SIZE";

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_RATE_LIMIT_SECS: u64 = 300;
pub const DEFAULT_STATE_DIR: &str = ".state";
pub const DEFAULT_TRIGGER_FILE: &str = "/tmp/discord_new_message.flag";
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Immutable bridge configuration.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Bot credential, sent as `Authorization: Bot <token>`.
    pub token: String,
    /// Channel the bridge reads from and posts to.
    pub channel_id: String,
    /// The bridge's own user id. Enables self-exclusion when set.
    pub own_id: Option<String>,
    /// Authors permitted to interact. Empty permits everyone.
    pub allowed_users: AllowList,
    /// Minimum interval between successful sends. Zero disables the limit.
    pub rate_limit: Duration,
    /// Base URL of the chat API.
    pub api_base: String,
    /// Directory holding the cursor files.
    pub state_dir: PathBuf,
    /// Hand-off file for the terminal injector.
    pub trigger_file: PathBuf,
    /// Page size for `unread` when no cursor exists yet.
    pub page_size: usize,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("own_id", &self.own_id)
            .field("allowed_users", &self.allowed_users)
            .field("rate_limit", &self.rate_limit)
            .field("api_base", &self.api_base)
            .field("state_dir", &self.state_dir)
            .field("trigger_file", &self.trigger_file)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl BridgeConfig {
    /// Minimal configuration with defaults for everything optional.
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            channel_id: channel_id.into(),
            own_id: None,
            allowed_users: AllowList::default(),
            rate_limit: Duration::from_secs(DEFAULT_RATE_LIMIT_SECS),
            api_base: DEFAULT_API_BASE.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            trigger_file: PathBuf::from(DEFAULT_TRIGGER_FILE),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get(ENV_TOKEN).ok_or_else(|| {
            Error::config(format!(
                "{ENV_TOKEN} not set. Copy .env.example to .env and fill in your values."
            ))
        })?;
        let channel_id = get(ENV_CHANNEL_ID)
            .ok_or_else(|| Error::config(format!("{ENV_CHANNEL_ID} not set.")))?;

        let mut config = Self::new(token, channel_id);
        config.own_id = get(ENV_OWN_ID);
        if let Some(raw) = get(ENV_ALLOWED_USERS) {
            config.allowed_users = AllowList::parse(&raw);
        }
        if let Some(raw) = get(ENV_RATE_LIMIT) {
            let secs: u64 = raw.parse().map_err(|_| {
                Error::config(format!(
                    "{ENV_RATE_LIMIT} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.rate_limit = Duration::from_secs(secs);
        }
        if let Some(base) = get(ENV_API_BASE) {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(dir) = get(ENV_STATE_DIR) {
            config.state_dir = PathBuf::from(dir);
        }
        if let Some(path) = get(ENV_TRIGGER_FILE) {
            config.trigger_file = PathBuf::from(path);
        }
        if let Some(raw) = get(ENV_PAGE_SIZE) {
            config.page_size = raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    Error::config(format!(
                        "{ENV_PAGE_SIZE} must be a positive integer, got {raw:?}"
                    ))
                })?;
        }

        debug!(?config, "configuration loaded");
        Ok(config)
    }
}

/// Seed the environment from a `.env` file without overriding variables that
/// are already set. With no explicit path the current directory is searched.
/// Returns the file that was loaded, if any.
pub fn load_dotenv(path: Option<&Path>) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| {
                Error::config(format!("cannot load env file {}: {e}", path.display()))
            })?;
            Ok(Some(path.to_path_buf()))
        }
        None => {
            let candidate = Path::new(".env");
            if !candidate.is_file() {
                return Ok(None);
            }
            dotenvy::from_path(candidate)
                .map_err(|e| Error::config(format!("cannot load .env: {e}")))?;
            Ok(Some(candidate.to_path_buf()))
        }
    }
}
