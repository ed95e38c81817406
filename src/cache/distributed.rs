use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::info;

use super::{Cache, CacheError};

/// Shared cache tier backed by Redis (`GET` / `SET EX`).
#[derive(Clone)]
pub struct DistributedCache {
    conn: ConnectionManager,
}

impl DistributedCache {
    /// Connect once; callers decide what to do when this fails.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis url: {}", e)))?;
        let conn = ConnectionManager::new(client).await?;
        info!("Connected to Redis cache");
        Ok(DistributedCache { conn })
    }
}

#[async_trait]
impl Cache for DistributedCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // Redis rejects a zero expiry.
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, secs).await?;
        Ok(())
    }
}
