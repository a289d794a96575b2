//! Chat administrator cache
//!
//! Administrator lookups back both the membership guard and the command
//! authorization checks, and the platform rate-limits the underlying call.
//! This cache bounds the call volume to one fetch per chat per TTL window,
//! accepting up to one window of staleness.

use moka::future::Cache;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::gateway::{GatewayError, PlatformGateway};

/// Per-chat administrator sets with a time-to-live.
///
/// An entry older than the TTL is treated as absent. Entries are
/// overwritten on refresh, never merged, and never explicitly deleted -
/// stale entries are simply superseded. Concurrent misses for the same chat
/// may both fetch (there is no single-flight de-duplication); the cache map
/// itself is safe under concurrent writers.
pub struct AdminCache {
    cache: Cache<i64, Arc<HashSet<i64>>>,
    gateway: Arc<dyn PlatformGateway>,
}

impl AdminCache {
    /// Create a cache over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn PlatformGateway>, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, gateway }
    }

    /// Administrator ids for a chat.
    ///
    /// A hit within the TTL answers from memory with no I/O. A miss or an
    /// expired entry fetches through the gateway and stores the fresh set
    /// with a new timestamp.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error on a failed refresh. Nothing is written
    /// in that case - the caller must treat the chat's administrator set as
    /// unknown rather than assume trust.
    pub async fn get_admins(&self, chat_id: i64) -> Result<Arc<HashSet<i64>>, GatewayError> {
        if let Some(admins) = self.cache.get(&chat_id).await {
            debug!(chat_id, "Admin cache hit");
            return Ok(admins);
        }

        let fresh = self.gateway.get_chat_administrators(chat_id).await?;
        debug!(chat_id, count = fresh.len(), "Admin cache refreshed");

        let admins = Arc::new(fresh);
        self.cache.insert(chat_id, admins.clone()).await;
        Ok(admins)
    }

    /// Number of chats currently cached, for health reporting.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use crate::gateway::MemberRestrictions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway stub that counts administrator fetches and can be told to
    /// fail for specific chats.
    struct CountingGateway {
        admins: HashSet<i64>,
        fetches: AtomicUsize,
        failing_chats: HashSet<i64>,
    }

    impl CountingGateway {
        fn with_admins(admins: impl IntoIterator<Item = i64>) -> Self {
            Self {
                admins: admins.into_iter().collect(),
                fetches: AtomicUsize::new(0),
                failing_chats: HashSet::new(),
            }
        }

        fn failing_for(mut self, chat_id: i64) -> Self {
            self.failing_chats.insert(chat_id);
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlatformGateway for CountingGateway {
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
            _: MemberRestrictions,
            _: Option<DateTime<Utc>>,
        ) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn get_chat_administrators(
            &self,
            chat_id: i64,
        ) -> Result<HashSet<i64>, GatewayError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing_chats.contains(&chat_id) {
                return Err(GatewayError::Network("connection reset".to_string()));
            }
            Ok(self.admins.clone())
        }
        async fn leave_chat(&self, _: i64) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_fetch() -> Result<(), GatewayError> {
        let gateway = Arc::new(CountingGateway::with_admins([1, 2, 3]));
        let cache = AdminCache::new(gateway.clone(), Duration::from_secs(60), 100);

        let first = cache.get_admins(-500).await?;
        let second = cache.get_admins(-500).await?;

        assert_eq!(first, second);
        assert_eq!(gateway.fetch_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() -> Result<(), GatewayError> {
        let gateway = Arc::new(CountingGateway::with_admins([1]));
        let cache = AdminCache::new(gateway.clone(), Duration::from_millis(50), 100);

        cache.get_admins(-500).await?;
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.get_admins(-500).await?;

        assert_eq!(gateway.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_distinct_chats_fetch_independently() -> Result<(), GatewayError> {
        let gateway = Arc::new(CountingGateway::with_admins([1]));
        let cache = AdminCache::new(gateway.clone(), Duration::from_secs(60), 100);

        cache.get_admins(-1).await?;
        cache.get_admins(-2).await?;

        assert_eq!(gateway.fetch_count(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_refresh_writes_nothing() {
        let gateway = Arc::new(CountingGateway::with_admins([1]).failing_for(-500));
        let cache = AdminCache::new(gateway.clone(), Duration::from_secs(60), 100);

        assert!(cache.get_admins(-500).await.is_err());

        // The failure left no entry behind, so the next call fetches again.
        assert!(cache.get_admins(-500).await.is_err());
        assert_eq!(gateway.fetch_count(), 2);
    }
}
