//! Event buffer trait and error types.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the event buffer.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("event buffer operation error: {0}")]
    Operation(String),
}

impl From<redis::RedisError> for BufferError {
    fn from(e: redis::RedisError) -> Self {
        Self::Operation(e.to_string())
    }
}

/// Result type for event buffer operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Random token identifying one holder of the flush lease.
pub(crate) fn lease_token() -> String {
    let mut rng = rand::rng();
    format!("{:032x}", rng.random::<u128>())
}

/// Shared FIFO queue of serialized click events plus live click counters.
///
/// Producers append to the tail; a drain reads from the head with
/// [`EventBuffer::peek`] and removes what it persisted with
/// [`EventBuffer::trim`]. Events appended between a peek and a trim are kept.
///
/// Trimming by count is only correct with a single reader, so every drain
/// must hold the flush lease ([`EventBuffer::acquire_flush_lease`]) for its
/// whole duration, whichever process runs it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBuffer: Send + Sync {
    /// Appends a payload to the tail of the queue.
    async fn push(&self, payload: &str) -> BufferResult<()>;

    /// Appends payloads to the tail, keeping their order.
    async fn push_many(&self, payloads: &[String]) -> BufferResult<()> {
        for payload in payloads {
            self.push(payload).await?;
        }
        Ok(())
    }

    /// Returns up to `count` payloads from the head without removing them.
    async fn peek(&self, count: usize) -> BufferResult<Vec<String>>;

    /// Removes exactly `count` payloads from the head.
    async fn trim(&self, count: usize) -> BufferResult<()>;

    /// Number of payloads waiting in the queue.
    async fn len(&self) -> BufferResult<usize>;

    /// Increments the best-effort live counter for a link; returns the new value.
    async fn incr_counter(&self, link_id: i64) -> BufferResult<i64>;

    /// Increments the live counter once per entry of `link_ids`.
    async fn incr_counters(&self, link_ids: &[i64]) -> BufferResult<()> {
        for &link_id in link_ids {
            self.incr_counter(link_id).await?;
        }
        Ok(())
    }

    /// Reads the live counter for a link, `None` if never incremented.
    async fn counter(&self, link_id: i64) -> BufferResult<Option<i64>>;

    /// Takes the exclusive drain lease for at most `ttl`.
    ///
    /// Returns the holder token, or `None` while another drain holds the lease.
    async fn acquire_flush_lease(&self, ttl: Duration) -> BufferResult<Option<String>>;

    /// Releases the lease if `token` still holds it; a lease that expired or
    /// was taken over is left alone.
    async fn release_flush_lease(&self, token: &str) -> BufferResult<()>;
}
