//! Stage chain - ordered, vetoable event processing.
//!
//! Provides the [`Stage`] trait and the [`Dispatcher`] that runs registered
//! stages in order for every inbound event.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::context::DispatchContext;
use super::event::Event;

/// What a stage decided about the current event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageOutcome {
    /// Hand the event to the next stage (or to command logic).
    #[default]
    Continue,
    /// Drop the event; no further stage or command logic runs.
    Stop,
}

/// One link in the dispatch chain.
///
/// Stages may carry side effects, but must not assume they are the last
/// stage. A stage that cannot establish trust in the event returns
/// [`StageOutcome::Stop`]; best-effort platform side effects are logged and
/// swallowed inside the stage, never bubbled into the chain.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Name of the stage for logging and veto attribution.
    fn name(&self) -> &'static str;

    /// Inspect (and possibly act on) the event.
    async fn handle(&self, event: &Event, ctx: &DispatchContext) -> StageOutcome;
}

/// Dispatch-level failures. Stage decisions are not errors; this only
/// covers precondition violations at the boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// `dispatch` was called before any stage was registered.
    #[error("dispatch invoked with no registered stages")]
    NoStages,
}

/// Result of one full dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every stage returned `Continue`; the event may reach command logic.
    Completed,
    /// A stage vetoed the event.
    Vetoed {
        /// Name of the stage that stopped the chain.
        stage: &'static str,
    },
}

impl DispatchOutcome {
    /// Whether command logic should see the event.
    #[must_use]
    pub const fn survived(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Ordered chain of stages applied to every inbound event.
///
/// Registration order is part of the contract: the production wiring puts
/// blacklist enforcement before anything that records or responds to a
/// user's activity, and the membership guard before anything that persists
/// chat state.
pub struct Dispatcher {
    stages: Vec<Box<dyn Stage>>,
    context: DispatchContext,
}

impl Dispatcher {
    /// Create a dispatcher over the shared dependency set.
    #[must_use]
    pub fn new(context: DispatchContext) -> Self {
        Self {
            stages: Vec::new(),
            context,
        }
    }

    /// Append a stage to the chain.
    pub fn register(&mut self, stage: Box<dyn Stage>) {
        info!(stage = stage.name(), "Registered dispatch stage");
        self.stages.push(stage);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run the chain for one event.
    ///
    /// Stages execute strictly sequentially in registration order; the
    /// first `Stop` halts the chain and the event is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoStages`] if no stage was ever registered -
    /// a wiring bug that must fail fast rather than silently pass every
    /// event through.
    pub async fn dispatch(&self, event: &Event) -> Result<DispatchOutcome, DispatchError> {
        if self.stages.is_empty() {
            return Err(DispatchError::NoStages);
        }

        // Fresh context per event; only the shared handles are cloned. It
        // drops when the chain completes.
        let ctx = self.context.clone();

        for stage in &self.stages {
            match stage.handle(event, &ctx).await {
                StageOutcome::Continue => {
                    debug!(stage = stage.name(), "Stage passed event through");
                }
                StageOutcome::Stop => {
                    info!(stage = stage.name(), "Stage vetoed event");
                    return Ok(DispatchOutcome::Vetoed {
                        stage: stage.name(),
                    });
                }
            }
        }

        Ok(DispatchOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::event::{Author, ChatKind, ChatRef, MessageEvent};
    use crate::gateway::{GatewayError, PlatformGateway};
    use crate::membership::AdminCache;
    use crate::store::{InMemoryBlockList, InMemoryHistory, InMemoryManagedChats};
    use chrono::{DateTime, Utc};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct NullGateway;

    #[async_trait]
    impl PlatformGateway for NullGateway {
        async fn send_message(&self, _: i64, _: &str) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn delete_message(&self, _: i64, _: i32) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn ban_member(&self, _: i64, _: i64, _: bool) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn unban_member(&self, _: i64, _: i64) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn restrict_member(
            &self,
            _: i64,
            _: i64,
            _: crate::gateway::MemberRestrictions,
            _: Option<DateTime<Utc>>,
        ) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn get_chat_administrators(&self, _: i64) -> Result<HashSet<i64>, GatewayError> {
            Ok(HashSet::new())
        }
        async fn leave_chat(&self, _: i64) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn test_context() -> DispatchContext {
        let gateway: Arc<dyn PlatformGateway> = Arc::new(NullGateway);
        DispatchContext {
            admins: Arc::new(AdminCache::new(
                gateway.clone(),
                Duration::from_secs(60),
                100,
            )),
            gateway,
            blocklist: Arc::new(InMemoryBlockList::new()),
            chats: Arc::new(InMemoryManagedChats::new()),
            history: Arc::new(InMemoryHistory::new()),
            operators: Arc::new(HashSet::new()),
        }
    }

    fn test_event() -> Event {
        Event::Message(MessageEvent {
            chat: ChatRef {
                id: -100,
                kind: ChatKind::Group,
            },
            author: Author {
                id: 1,
                username: None,
                first_name: "Test".to_string(),
            },
            message_id: 10,
            text: Some("hello".to_string()),
            reply_to: None,
        })
    }

    struct RecordingStage {
        name: &'static str,
        outcome: StageOutcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for RecordingStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn handle(&self, _event: &Event, _ctx: &DispatchContext) -> StageOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    #[tokio::test]
    async fn test_empty_dispatcher_fails_fast() {
        let dispatcher = Dispatcher::new(test_context());
        let result = dispatcher.dispatch(&test_event()).await;
        assert_eq!(result, Err(DispatchError::NoStages));
    }

    #[tokio::test]
    async fn test_chain_stops_at_first_veto() -> Result<(), DispatchError> {
        let mut dispatcher = Dispatcher::new(test_context());
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let third = Arc::new(AtomicUsize::new(0));

        dispatcher.register(Box::new(RecordingStage {
            name: "first",
            outcome: StageOutcome::Continue,
            calls: first.clone(),
        }));
        dispatcher.register(Box::new(RecordingStage {
            name: "second",
            outcome: StageOutcome::Stop,
            calls: second.clone(),
        }));
        dispatcher.register(Box::new(RecordingStage {
            name: "third",
            outcome: StageOutcome::Continue,
            calls: third.clone(),
        }));

        let outcome = dispatcher.dispatch(&test_event()).await?;

        assert_eq!(outcome, DispatchOutcome::Vetoed { stage: "second" });
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(third.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_full_pass_completes() -> Result<(), DispatchError> {
        let mut dispatcher = Dispatcher::new(test_context());
        let calls = Arc::new(AtomicUsize::new(0));

        for name in ["a", "b"] {
            dispatcher.register(Box::new(RecordingStage {
                name,
                outcome: StageOutcome::Continue,
                calls: calls.clone(),
            }));
        }

        let outcome = dispatcher.dispatch(&test_event()).await?;
        assert!(outcome.survived());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
