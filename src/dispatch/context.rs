//! Per-event dependency context.

use std::collections::HashSet;
use std::sync::Arc;

use crate::gateway::PlatformGateway;
use crate::membership::AdminCache;
use crate::store::{BlockListStore, HistoryStore, ManagedChatStore};

/// Dependencies handed to every stage of one dispatch pass.
///
/// Fields are declared up front rather than discovered by key at runtime;
/// a context is built once per event and dropped when the chain completes.
/// All handles are shared, so construction is a handful of `Arc` clones.
#[derive(Clone)]
pub struct DispatchContext {
    pub gateway: Arc<dyn PlatformGateway>,
    pub admins: Arc<AdminCache>,
    pub blocklist: Arc<dyn BlockListStore>,
    pub chats: Arc<dyn ManagedChatStore>,
    pub history: Arc<dyn HistoryStore>,
    /// Operator identities authorized regardless of per-chat role, loaded
    /// once at startup.
    pub operators: Arc<HashSet<i64>>,
}
