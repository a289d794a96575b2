//! Platform gateway boundary
//!
//! Every call into the chat platform goes through the [`PlatformGateway`]
//! trait so that the dispatch pipeline and the moderation coordinator stay
//! independent of the concrete transport. The Telegram implementation lives
//! in [`telegram`].

pub mod telegram;

pub use telegram::TelegramGateway;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by platform calls.
///
/// Permission failures and transient network failures are surfaced the same
/// way: the action did not apply, and the caller decides what to tell the
/// human. The gateway never retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The platform rejected the call (bad request, missing rights, kicked).
    #[error("platform rejected the call: {0}")]
    Api(String),
    /// The call never completed (network failure, rate limit, server error).
    #[error("platform unreachable: {0}")]
    Network(String),
    /// The call exceeded the caller-level timeout.
    #[error("platform call timed out after {0:?}")]
    Timeout(Duration),
}

/// Permission mask applied when restricting a chat member.
///
/// Field set follows what the moderation flows actually toggle; everything
/// not listed stays at the platform default for restricted members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRestrictions {
    pub can_send_messages: bool,
    pub can_send_media: bool,
    pub can_send_polls: bool,
    pub can_send_other: bool,
}

impl MemberRestrictions {
    /// Read-only mask used for mutes.
    #[must_use]
    pub const fn muted() -> Self {
        Self {
            can_send_messages: false,
            can_send_media: false,
            can_send_polls: false,
            can_send_other: false,
        }
    }

    /// Full message permissions, used to lift a mute.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            can_send_messages: true,
            can_send_media: true,
            can_send_polls: true,
            can_send_other: true,
        }
    }
}

/// Opaque RPC boundary to the chat platform.
///
/// All methods are network round-trips that can fail or time out; callers
/// own any timeout policy.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Send a plain text message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), GatewayError>;

    /// Delete a single message from a chat.
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError>;

    /// Ban a member, optionally revoking their message history.
    async fn ban_member(
        &self,
        chat_id: i64,
        user_id: i64,
        revoke_history: bool,
    ) -> Result<(), GatewayError>;

    /// Lift a ban so the user may rejoin.
    async fn unban_member(&self, chat_id: i64, user_id: i64) -> Result<(), GatewayError>;

    /// Apply a permission mask to a member, optionally until a deadline.
    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: i64,
        restrictions: MemberRestrictions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError>;

    /// Fetch the current administrator set of a chat.
    async fn get_chat_administrators(&self, chat_id: i64) -> Result<HashSet<i64>, GatewayError>;

    /// Leave a chat the service should not operate in.
    async fn leave_chat(&self, chat_id: i64) -> Result<(), GatewayError>;
}
