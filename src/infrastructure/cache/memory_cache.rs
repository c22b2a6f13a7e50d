//! Process-local cache with per-entry expiry.

use super::service::{CacheResult, CacheService};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory cache backed by a `DashMap`.
///
/// Entries expire lazily: an expired entry is removed on the next read.
/// Useful for single-instance deployments and tests; it offers no sharing
/// across processes.
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(default_ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }

    /// Number of entries currently stored, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > now {
                return Ok(Some(value.clone()));
            }
        }
        self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let ttl = ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl);
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryCache::new(60);
        cache.set("k", "v", None).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new(60);
        cache.set("k", "v", Some(5)).await.unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_missing_key_is_ok() {
        let cache = MemoryCache::new(60);
        assert!(cache.invalidate("missing").await.is_ok());

        cache.set("k", "v", None).await.unwrap();
        cache.invalidate("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
