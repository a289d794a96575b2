//! Telegram implementation of the platform gateway.

use super::{GatewayError, MemberRestrictions, PlatformGateway};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatPermissions, MessageId, UserId};
use teloxide::RequestError;

/// [`PlatformGateway`] backed by a teloxide [`Bot`].
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl From<RequestError> for GatewayError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(api) => Self::Api(api.to_string()),
            other => Self::Network(other.to_string()),
        }
    }
}

fn to_permissions(restrictions: MemberRestrictions) -> ChatPermissions {
    let mut permissions = ChatPermissions::empty();
    if restrictions.can_send_messages {
        permissions |= ChatPermissions::SEND_MESSAGES;
    }
    if restrictions.can_send_media {
        permissions |= ChatPermissions::SEND_MEDIA_MESSAGES;
    }
    if restrictions.can_send_polls {
        permissions |= ChatPermissions::SEND_POLLS;
    }
    if restrictions.can_send_other {
        permissions |= ChatPermissions::SEND_OTHER_MESSAGES;
    }
    permissions
}

#[async_trait]
impl PlatformGateway for TelegramGateway {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), GatewayError> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), GatewayError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await?;
        Ok(())
    }

    async fn ban_member(
        &self,
        chat_id: i64,
        user_id: i64,
        revoke_history: bool,
    ) -> Result<(), GatewayError> {
        self.bot
            .ban_chat_member(ChatId(chat_id), UserId(user_id.cast_unsigned()))
            .revoke_messages(revoke_history)
            .await?;
        Ok(())
    }

    async fn unban_member(&self, chat_id: i64, user_id: i64) -> Result<(), GatewayError> {
        self.bot
            .unban_chat_member(ChatId(chat_id), UserId(user_id.cast_unsigned()))
            .await?;
        Ok(())
    }

    async fn restrict_member(
        &self,
        chat_id: i64,
        user_id: i64,
        restrictions: MemberRestrictions,
        until: Option<DateTime<Utc>>,
    ) -> Result<(), GatewayError> {
        let request = self.bot.restrict_chat_member(
            ChatId(chat_id),
            UserId(user_id.cast_unsigned()),
            to_permissions(restrictions),
        );
        match until {
            Some(deadline) => request.until_date(deadline).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn get_chat_administrators(&self, chat_id: i64) -> Result<HashSet<i64>, GatewayError> {
        let members = self.bot.get_chat_administrators(ChatId(chat_id)).await?;
        Ok(members
            .into_iter()
            .map(|member| member.user.id.0.cast_signed())
            .collect())
    }

    async fn leave_chat(&self, chat_id: i64) -> Result<(), GatewayError> {
        self.bot.leave_chat(ChatId(chat_id)).await?;
        Ok(())
    }
}
