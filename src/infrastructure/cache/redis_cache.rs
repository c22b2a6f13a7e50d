//! Redis-backed cache implementation.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

/// Redis cache for resolution snapshots.
///
/// Shares a `ConnectionManager` with the event buffer; the manager reconnects
/// transparently. Errors are returned to the caller, which decides whether
/// they are fatal (they never are on the redirect path).
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
}

impl RedisCache {
    /// Creates a cache on top of an established connection.
    ///
    /// `default_ttl_seconds` is applied when [`CacheService::set`] is called
    /// with `ttl_seconds = None`; controlled via `CACHE_TTL_SECONDS`.
    pub fn new(client: ConnectionManager, default_ttl_seconds: u64) -> Self {
        Self {
            client,
            default_ttl: default_ttl_seconds,
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.client.clone();
        let value = conn.get::<_, Option<String>>(key).await?;

        if value.is_some() {
            debug!("Cache HIT: {}", key);
        } else {
            debug!("Cache MISS: {}", key);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        conn.set_ex::<_, _, ()>(key, value, ttl).await?;
        debug!("Cache SET: {} (TTL: {}s)", key, ttl);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let deleted = conn.del::<_, i32>(key).await?;

        if deleted > 0 {
            debug!("Cache INVALIDATE: {}", key);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
