//! Blacklist enforcement stage.

use async_trait::async_trait;
use tracing::{error, warn};

use crate::dispatch::context::DispatchContext;
use crate::dispatch::dispatcher::{Stage, StageOutcome};
use crate::dispatch::event::Event;

/// Drops every message from a block-listed author, banning them from the
/// originating chat and deleting the message on the way out.
///
/// The ban and the delete are independent best-effort side effects: each
/// failure is logged and swallowed, neither rolls back the other, and the
/// user stays blocked either way - they will be re-evaluated on their next
/// event.
pub struct BlacklistStage;

#[async_trait]
impl Stage for BlacklistStage {
    fn name(&self) -> &'static str {
        "blacklist"
    }

    async fn handle(&self, event: &Event, ctx: &DispatchContext) -> StageOutcome {
        let Event::Message(message) = event else {
            return StageOutcome::Continue;
        };

        let blocked = match ctx.blocklist.is_blocked(message.author.id).await {
            Ok(blocked) => blocked,
            Err(err) => {
                // Unknown block state: let the event through rather than
                // moderate on a guess.
                error!(user_id = message.author.id, "Block list unavailable: {err}");
                return StageOutcome::Continue;
            }
        };

        if !blocked {
            return StageOutcome::Continue;
        }

        if let Err(err) = ctx
            .gateway
            .ban_member(message.chat.id, message.author.id, false)
            .await
        {
            warn!(
                user_id = message.author.id,
                chat_id = message.chat.id,
                "Failed to ban block-listed user (possibly already banned): {err}"
            );
        }

        if let Err(err) = ctx
            .gateway
            .delete_message(message.chat.id, message.message_id)
            .await
        {
            warn!(
                message_id = message.message_id,
                chat_id = message.chat.id,
                "Failed to delete message from block-listed user: {err}"
            );
        }

        StageOutcome::Stop
    }
}
