//! Observation history stage.

use async_trait::async_trait;
use tracing::error;

use crate::dispatch::context::DispatchContext;
use crate::dispatch::dispatcher::{Stage, StageOutcome};
use crate::dispatch::event::Event;

/// Records the observed author of every event, and the message itself for
/// message events.
///
/// Pure enricher: store failures are logged and swallowed, and the event
/// always continues. Must be registered after the guards so that blocked
/// users and unmanaged chats never reach the history store.
pub struct HistoryStage;

#[async_trait]
impl Stage for HistoryStage {
    fn name(&self) -> &'static str {
        "history"
    }

    async fn handle(&self, event: &Event, ctx: &DispatchContext) -> StageOutcome {
        if let Err(err) = ctx.history.record_user(event.author()).await {
            error!(user_id = event.author().id, "Error while saving user: {err}");
        }

        if let Event::Message(message) = event {
            if let Err(err) = ctx.history.record_message(message).await {
                error!(
                    message_id = message.message_id,
                    "Error while saving message: {err}"
                );
            }
        }

        StageOutcome::Continue
    }
}
