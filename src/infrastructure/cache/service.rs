//! Cache service trait and error types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    Connection(String),
    #[error("cache operation error: {0}")]
    Operation(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        Self::Operation(e.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Builds the resolution cache key for a host and short code.
///
/// The host is used verbatim (port included) so that invalidation by the
/// same raw host always hits the same key. `%` and `:` in the code are
/// percent-encoded, so the last `:` of the key always separates host from code.
pub fn snapshot_key(host: &str, code: &str) -> String {
    let code = code.replace('%', "%25").replace(':', "%3A");
    format!("link:{}:{}", host, code)
}

/// Volatile key/value store sitting in front of the link table.
///
/// Implementations report failures as [`CacheError`]; callers on the read
/// path treat any error as a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - Process-local cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves a cached value.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))` on cache hit
    /// - `Ok(None)` on cache miss or expired entry
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores a value with an optional TTL in seconds.
    ///
    /// `None` applies the implementation's default TTL.
    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()>;

    /// Removes a cached value. Removing a missing key is not an error.
    async fn invalidate(&self, key: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
