//! Membership guard stage.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::dispatch::context::DispatchContext;
use crate::dispatch::dispatcher::{Stage, StageOutcome};
use crate::dispatch::event::Event;

/// Ensures the service only operates in chats where at least one trusted
/// operator is an administrator.
///
/// Administrator sets come from the cache, never from a direct fetch, which
/// bounds API call volume and accepts up to one TTL window of staleness: an
/// operator leaving a chat is only noticed once the cached entry expires.
///
/// A chat with no trusted operator among its admins is actively evicted -
/// the service leaves it and drops the event. A failed admin lookup
/// establishes no trust either way: the event is dropped, but the chat is
/// kept, since evicting on a transient platform error would abandon healthy
/// chats.
pub struct MembershipGuardStage;

#[async_trait]
impl Stage for MembershipGuardStage {
    fn name(&self) -> &'static str {
        "membership-guard"
    }

    async fn handle(&self, event: &Event, ctx: &DispatchContext) -> StageOutcome {
        let Some(chat) = event.chat() else {
            return StageOutcome::Continue;
        };
        if !chat.is_multi_user() {
            return StageOutcome::Continue;
        }

        let admins = match ctx.admins.get_admins(chat.id).await {
            Ok(admins) => admins,
            Err(err) => {
                warn!(chat_id = chat.id, "Admin lookup failed, trust not established: {err}");
                return StageOutcome::Stop;
            }
        };

        if ctx.operators.iter().any(|operator| admins.contains(operator)) {
            if let Err(err) = ctx.chats.record_managed_chat(chat.id).await {
                warn!(chat_id = chat.id, "Failed to record managed chat: {err}");
            }
            return StageOutcome::Continue;
        }

        info!(chat_id = chat.id, "No trusted operator among admins, leaving chat");
        if let Err(err) = ctx.gateway.leave_chat(chat.id).await {
            warn!(chat_id = chat.id, "Failed to leave chat: {err}");
        }
        StageOutcome::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::event::{Author, ChatKind, ChatRef, MessageEvent};
    use crate::dispatch::testing::{RecordedCall, TestGateway};
    use crate::membership::AdminCache;
    use crate::store::{
        InMemoryBlockList, InMemoryHistory, InMemoryManagedChats, ManagedChatStore,
    };
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    fn context_with(
        gateway: Arc<TestGateway>,
        operators: impl IntoIterator<Item = i64>,
    ) -> (DispatchContext, Arc<InMemoryManagedChats>) {
        let chats = Arc::new(InMemoryManagedChats::new());
        let gateway_dyn: Arc<dyn crate::gateway::PlatformGateway> = gateway;
        let ctx = DispatchContext {
            admins: Arc::new(AdminCache::new(
                gateway_dyn.clone(),
                Duration::from_secs(60),
                100,
            )),
            gateway: gateway_dyn,
            blocklist: Arc::new(InMemoryBlockList::new()),
            chats: chats.clone(),
            history: Arc::new(InMemoryHistory::new()),
            operators: Arc::new(operators.into_iter().collect::<HashSet<i64>>()),
        };
        (ctx, chats)
    }

    fn group_message(chat_id: i64) -> Event {
        Event::Message(MessageEvent {
            chat: ChatRef {
                id: chat_id,
                kind: ChatKind::Group,
            },
            author: Author {
                id: 9,
                username: None,
                first_name: "Member".to_string(),
            },
            message_id: 1,
            text: None,
            reply_to: None,
        })
    }

    fn private_message() -> Event {
        Event::Message(MessageEvent {
            chat: ChatRef {
                id: 9,
                kind: ChatKind::Private,
            },
            author: Author {
                id: 9,
                username: None,
                first_name: "Member".to_string(),
            },
            message_id: 1,
            text: None,
            reply_to: None,
        })
    }

    #[tokio::test]
    async fn test_trusted_operator_present_records_chat() {
        let gateway = Arc::new(TestGateway::new().with_admins([10, 20, 30]));
        let (ctx, chats) = context_with(gateway.clone(), [20]);

        let outcome = MembershipGuardStage.handle(&group_message(-7), &ctx).await;

        assert_eq!(outcome, StageOutcome::Continue);
        assert_eq!(
            chats.list_managed_chats().await.expect("in-memory list"),
            vec![-7]
        );
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_trusted_operator_leaves_once_and_stops() {
        // Three admins, none of them trusted.
        let gateway = Arc::new(TestGateway::new().with_admins([10, 20, 30]));
        let (ctx, chats) = context_with(gateway.clone(), [999]);

        let outcome = MembershipGuardStage.handle(&group_message(-7), &ctx).await;

        assert_eq!(outcome, StageOutcome::Stop);
        assert_eq!(gateway.calls(), vec![RecordedCall::Leave { chat_id: -7 }]);
        assert!(chats
            .list_managed_chats()
            .await
            .expect("in-memory list")
            .is_empty());
    }

    #[tokio::test]
    async fn test_private_chat_passes_without_lookup() {
        let gateway = Arc::new(TestGateway::new());
        let (ctx, _) = context_with(gateway.clone(), [999]);

        let outcome = MembershipGuardStage.handle(&private_message(), &ctx).await;

        assert_eq!(outcome, StageOutcome::Continue);
        assert_eq!(gateway.admin_fetches(), 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_stops_without_leaving() {
        let gateway = Arc::new(TestGateway::new().failing_admin_fetches());
        let (ctx, _) = context_with(gateway.clone(), [999]);

        let outcome = MembershipGuardStage.handle(&group_message(-7), &ctx).await;

        assert_eq!(outcome, StageOutcome::Stop);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_second_event_answers_from_cache() {
        let gateway = Arc::new(TestGateway::new().with_admins([999]));
        let (ctx, _) = context_with(gateway.clone(), [999]);

        MembershipGuardStage.handle(&group_message(-7), &ctx).await;
        MembershipGuardStage.handle(&group_message(-7), &ctx).await;

        assert_eq!(gateway.admin_fetches(), 1);
    }
}
