//! Persistence collaborators
//!
//! The block list, managed-chat registry, and observation history are owned
//! by an external persistence layer. This module pins down their interface
//! boundary and ships in-memory reference implementations used by the
//! runtime default wiring and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::dispatch::{Author, MessageEvent};

/// Errors surfaced by the persistence collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A user barred from acting in any managed chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockListEntry {
    pub user_id: i64,
    pub blocked_at: DateTime<Utc>,
}

/// Block-list boundary. Presence of a user implies they must never be
/// allowed to act in any managed chat.
#[async_trait]
pub trait BlockListStore: Send + Sync {
    /// One read; `O(1)` against the in-memory implementation.
    async fn is_blocked(&self, user_id: i64) -> Result<bool, StoreError>;

    /// Add a user to the block list. Blocking an already-blocked user is a
    /// no-op and keeps the original `blocked_at`.
    async fn block(&self, user_id: i64) -> Result<(), StoreError>;

    /// Remove a user from the block list. Unblocking an absent user is a
    /// no-op.
    async fn unblock(&self, user_id: i64) -> Result<(), StoreError>;

    /// Current entries, unordered.
    async fn blocked_users(&self) -> Result<Vec<BlockListEntry>, StoreError>;
}

/// Registry of chats the service actively operates in.
#[async_trait]
pub trait ManagedChatStore: Send + Sync {
    async fn list_managed_chats(&self) -> Result<Vec<i64>, StoreError>;

    /// Idempotent; recording a known chat is a no-op.
    async fn record_managed_chat(&self, chat_id: i64) -> Result<(), StoreError>;
}

/// Sink for observed users and messages.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn record_user(&self, author: &Author) -> Result<(), StoreError>;
    async fn record_message(&self, message: &MessageEvent) -> Result<(), StoreError>;
}

/// In-memory block list.
#[derive(Default)]
pub struct InMemoryBlockList {
    entries: RwLock<HashMap<i64, DateTime<Utc>>>,
}

impl InMemoryBlockList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlockListStore for InMemoryBlockList {
    async fn is_blocked(&self, user_id: i64) -> Result<bool, StoreError> {
        Ok(self.entries.read().await.contains_key(&user_id))
    }

    async fn block(&self, user_id: i64) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .entry(user_id)
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn unblock(&self, user_id: i64) -> Result<(), StoreError> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }

    async fn blocked_users(&self) -> Result<Vec<BlockListEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .map(|(&user_id, &blocked_at)| BlockListEntry {
                user_id,
                blocked_at,
            })
            .collect())
    }
}

/// In-memory managed-chat registry.
#[derive(Default)]
pub struct InMemoryManagedChats {
    chats: RwLock<HashSet<i64>>,
}

impl InMemoryManagedChats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry, mainly for tests and cold starts.
    pub async fn seed(&self, chat_ids: impl IntoIterator<Item = i64>) {
        self.chats.write().await.extend(chat_ids);
    }
}

#[async_trait]
impl ManagedChatStore for InMemoryManagedChats {
    async fn list_managed_chats(&self) -> Result<Vec<i64>, StoreError> {
        let mut chats: Vec<i64> = self.chats.read().await.iter().copied().collect();
        chats.sort_unstable();
        Ok(chats)
    }

    async fn record_managed_chat(&self, chat_id: i64) -> Result<(), StoreError> {
        self.chats.write().await.insert(chat_id);
        Ok(())
    }
}

/// In-memory observation history.
#[derive(Default)]
pub struct InMemoryHistory {
    users: RwLock<HashMap<i64, Author>>,
    messages: RwLock<Vec<MessageEvent>>,
}

impl InMemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn message_count(&self) -> usize {
        self.messages.read().await.len()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    async fn record_user(&self, author: &Author) -> Result<(), StoreError> {
        self.users.write().await.insert(author.id, author.clone());
        Ok(())
    }

    async fn record_message(&self, message: &MessageEvent) -> Result<(), StoreError> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }
}
