//! Process-local cache tier.
//!
//! Entries carry an absolute expiry instant. An expired entry is removed the
//! first time it is read, and `evict_expired` sweeps whatever was never read
//! again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Clone, Default)]
pub struct LocalCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.payload.clone()),
                Some(_) => {}
            }
        }
        // Re-check under the write lock; a concurrent set may have refreshed it.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                debug!("LocalCache: evicted expired key {}", key);
                None
            }
            Some(entry) => Some(entry.payload.clone()),
            None => None,
        }
    }

    pub async fn set(&self, key: &str, payload: &str, ttl: Duration) {
        let entry = CacheEntry {
            payload: payload.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_get_after_set_returns_value() {
        let cache = LocalCache::new();
        cache.set("k", "v", Duration::from_secs(300)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss_and_evicted() {
        let cache = LocalCache::new();
        cache.set("k", "v", Duration::from_secs(300)).await;

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_expiry() {
        let cache = LocalCache::new();
        cache.set("k", "old", Duration::from_secs(10)).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set("k", "new", Duration::from_secs(10)).await;
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired_sweeps_unread_entries() {
        let cache = LocalCache::new();
        cache.set("short", "a", Duration::from_secs(5)).await;
        cache.set("long", "b", Duration::from_secs(500)).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(cache.evict_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("long").await.as_deref(), Some("b"));
    }
}
