//! Configuration and settings management
//!
//! Loads settings from environment variables and defines moderation tunables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Comma-separated list of trusted operator IDs
    #[serde(rename = "trusted_operators")]
    pub trusted_operators_str: Option<String>,

    /// Chat that receives `/report` forwards
    pub report_chat_id: Option<i64>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Environment variables win; empty values are treated as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Returns the set of Telegram IDs trusted to operate the bot in any chat
    #[must_use]
    pub fn trusted_operators(&self) -> HashSet<i64> {
        self.trusted_operators_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Time-to-live for cached chat administrator sets
pub const ADMIN_CACHE_TTL_SECS: u64 = 30 * 60;
/// Maximum number of chats tracked by the administrator cache
pub const ADMIN_CACHE_MAX_CAPACITY: u64 = 10_000;
/// Upper bound on a single platform call before it is recorded as failed
pub const GATEWAY_CALL_TIMEOUT_SECS: u64 = 30;
/// Mute applied when the command does not specify a duration
pub const DEFAULT_MUTE_MINUTES: u32 = 5;
