//! Moderation fan-out coordinator.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{ModerationAction, ModerationOutcome};
use crate::gateway::{GatewayError, MemberRestrictions, PlatformGateway};
use crate::store::{ManagedChatStore, StoreError};

/// Applies moderation actions to one chat or fanned out across every
/// managed chat.
///
/// The coordinator classifies each per-chat call as applied or failed and
/// never swallows a failure - the complete outcome list goes back to the
/// caller for reporting. It also never retries; a re-sweep is a caller
/// concern.
pub struct ModerationCoordinator {
    gateway: Arc<dyn PlatformGateway>,
    chats: Arc<dyn ManagedChatStore>,
    call_timeout: Duration,
}

impl ModerationCoordinator {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PlatformGateway>,
        chats: Arc<dyn ManagedChatStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            chats,
            call_timeout,
        }
    }

    /// Apply one action to one chat.
    ///
    /// Mute expiries are resolved against the clock here, at application
    /// time, not when the command text was parsed. A call that outlives the
    /// configured timeout is recorded as failed without waiting further.
    pub async fn apply(
        &self,
        action: &ModerationAction,
        user_id: i64,
        chat_id: i64,
    ) -> ModerationOutcome {
        let call = async {
            match action {
                ModerationAction::Ban { revoke_history } => {
                    self.gateway
                        .ban_member(chat_id, user_id, *revoke_history)
                        .await
                }
                ModerationAction::Unban => self.gateway.unban_member(chat_id, user_id).await,
                ModerationAction::Mute(duration) => {
                    let until = duration.expiry_from(Utc::now());
                    self.gateway
                        .restrict_member(
                            chat_id,
                            user_id,
                            MemberRestrictions::muted(),
                            Some(until),
                        )
                        .await
                }
                ModerationAction::Unmute => {
                    self.gateway
                        .restrict_member(chat_id, user_id, MemberRestrictions::unrestricted(), None)
                        .await
                }
            }
        };

        let result = match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.call_timeout)),
        };

        if let Err(err) = &result {
            warn!(
                chat_id,
                user_id,
                action = %action.kind(),
                "Moderation action failed: {err}"
            );
        }

        ModerationOutcome {
            chat_id,
            action: action.kind(),
            result,
        }
    }

    /// Apply one action to the target user in every managed chat.
    ///
    /// All per-chat calls run concurrently and every one is awaited
    /// regardless of individual failures; the returned list holds exactly
    /// one outcome per managed chat, in the store's listing order. Callers
    /// must not collapse it into a single flag.
    ///
    /// # Errors
    ///
    /// Fails only if the managed-chat list itself cannot be read.
    pub async fn apply_globally(
        &self,
        action: &ModerationAction,
        user_id: i64,
    ) -> Result<Vec<ModerationOutcome>, StoreError> {
        let chats = self.chats.list_managed_chats().await?;

        let outcomes = join_all(
            chats
                .iter()
                .map(|&chat_id| self.apply(action, user_id, chat_id)),
        )
        .await;

        Ok(outcomes)
    }
}

/// Convenience summary used by reporting code.
#[must_use]
pub fn count_failures(outcomes: &[ModerationOutcome]) -> usize {
    outcomes.iter().filter(|o| o.result.is_err()).count()
}
