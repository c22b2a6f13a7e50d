//! Shared Redis connection used by both the cache and the event buffer.

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::info;

use super::cache::CacheError;

/// Connects to Redis and validates the connection with a PING.
///
/// The returned `ConnectionManager` is cheap to clone and reconnects on its
/// own, so one instance backs every Redis-based component.
///
/// # Errors
///
/// Returns [`CacheError::Connection`] if the URL is invalid, the connection
/// cannot be established, or the PING fails.
pub async fn connect(redis_url: &str) -> Result<ConnectionManager, CacheError> {
    info!("Connecting to Redis");

    let client = Client::open(redis_url)
        .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

    let manager = ConnectionManager::new(client)
        .await
        .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

    info!("✓ Connected to Redis");
    Ok(manager)
}
