//! Two-tier payload cache.
//!
//! `FallbackCache` prefers the shared tier and silently falls back to the
//! process-local tier whenever the shared tier errors. Callers never see a
//! cache error. Concurrent misses may both recompute and both write; the last
//! write wins.

pub mod distributed;
pub mod local;

pub use distributed::DistributedCache;
pub use local::LocalCache;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A key/value store for opaque string payloads with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Shared tier (optional) in front of the local tier.
#[derive(Clone)]
pub struct FallbackCache {
    primary: Option<Arc<dyn Cache>>,
    local: LocalCache,
    default_ttl: Duration,
}

impl FallbackCache {
    pub fn new(primary: Option<Arc<dyn Cache>>, local: LocalCache, default_ttl: Duration) -> Self {
        FallbackCache {
            primary,
            local,
            default_ttl,
        }
    }

    pub fn local_only(default_ttl: Duration) -> Self {
        Self::new(None, LocalCache::new(), default_ttl)
    }

    pub fn local(&self) -> &LocalCache {
        &self.local
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(primary) = &self.primary {
            match primary.get(key).await {
                Ok(value) => return value,
                Err(e) => warn!(
                    "{} cache get failed for {}, using local: {}",
                    primary.name(),
                    key,
                    e
                ),
            }
        }
        self.local.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Some(primary) = &self.primary {
            match primary.set(key, value, ttl).await {
                Ok(()) => return,
                Err(e) => warn!(
                    "{} cache set failed for {}, using local: {}",
                    primary.name(),
                    key,
                    e
                ),
            }
        }
        self.local.set(key, value, ttl).await;
    }

    /// Decode a cached JSON payload; an undecodable payload counts as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Cached payload for {} could not be decoded: {}", key, e);
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw, ttl).await,
            Err(e) => warn!("Failed to encode payload for {}: {}", key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Always fails, like an unreachable Redis.
    struct DownCache {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Cache for DownCache {
        fn name(&self) -> &str {
            "down"
        }
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    /// Healthy shared tier without expiry.
    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl Cache for MapCache {
        fn name(&self) -> &str {
            "map"
        }
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            Ok(self.entries.lock().await.get(key).cloned())
        }
        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.entries.lock().await.insert(key.into(), value.into());
            Ok(())
        }
    }

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_failing_primary_falls_back_to_local() {
        let down = Arc::new(DownCache {
            calls: AtomicUsize::new(0),
        });
        let cache = FallbackCache::new(Some(down.clone()), LocalCache::new(), TTL);

        cache.set("live", "payload", TTL).await;
        assert_eq!(cache.get("live").await.as_deref(), Some("payload"));
        assert_eq!(down.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.local().len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_fallback_respects_ttl() {
        let down: Arc<dyn Cache> = Arc::new(DownCache {
            calls: AtomicUsize::new(0),
        });
        let cache = FallbackCache::new(Some(down), LocalCache::new(), TTL);

        cache.set("live", "payload", TTL).await;
        tokio::time::advance(TTL).await;
        assert!(cache.get("live").await.is_none());
    }

    #[tokio::test]
    async fn test_healthy_primary_is_preferred() {
        let primary = Arc::new(MapCache::default());
        let cache = FallbackCache::new(Some(primary.clone()), LocalCache::new(), TTL);

        cache.set("stats", "42", TTL).await;
        assert_eq!(cache.get("stats").await.as_deref(), Some("42"));
        assert_eq!(cache.local().len().await, 0);
        assert!(primary.entries.lock().await.contains_key("stats"));
    }

    #[tokio::test]
    async fn test_primary_miss_is_a_miss() {
        let cache = FallbackCache::new(
            Some(Arc::new(MapCache::default())),
            LocalCache::new(),
            TTL,
        );
        cache.local().set("k", "stale-local", TTL).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache = FallbackCache::local_only(TTL);
        cache.set_json("ids", &vec![1, 2, 3], TTL).await;
        assert_eq!(cache.get_json::<Vec<i32>>("ids").await, Some(vec![1, 2, 3]));

        cache.set("garbage", "not json", TTL).await;
        assert!(cache.get_json::<Vec<i32>>("garbage").await.is_none());
    }
}
