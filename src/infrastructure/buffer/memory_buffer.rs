//! Process-local event buffer.

use super::service::{BufferResult, EventBuffer, lease_token};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// In-memory event buffer with the same head/tail semantics as the Redis one.
///
/// Events do not survive a restart and are not shared between instances;
/// used when Redis is not configured, and in tests.
#[derive(Default)]
pub struct MemoryEventBuffer {
    queue: Mutex<VecDeque<String>>,
    counters: DashMap<i64, i64>,
    lease: Mutex<Option<(String, Instant)>>,
}

impl MemoryEventBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventBuffer for MemoryEventBuffer {
    async fn push(&self, payload: &str) -> BufferResult<()> {
        self.queue.lock().push_back(payload.to_string());
        Ok(())
    }

    async fn peek(&self, count: usize) -> BufferResult<Vec<String>> {
        Ok(self.queue.lock().iter().take(count).cloned().collect())
    }

    async fn trim(&self, count: usize) -> BufferResult<()> {
        let mut queue = self.queue.lock();
        let count = count.min(queue.len());
        queue.drain(..count);
        Ok(())
    }

    async fn len(&self) -> BufferResult<usize> {
        Ok(self.queue.lock().len())
    }

    async fn incr_counter(&self, link_id: i64) -> BufferResult<i64> {
        let mut entry = self.counters.entry(link_id).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn counter(&self, link_id: i64) -> BufferResult<Option<i64>> {
        Ok(self.counters.get(&link_id).map(|v| *v))
    }

    async fn acquire_flush_lease(&self, ttl: Duration) -> BufferResult<Option<String>> {
        let now = Instant::now();
        let mut lease = self.lease.lock();
        if lease.as_ref().is_some_and(|(_, expires_at)| *expires_at > now) {
            return Ok(None);
        }
        let token = lease_token();
        *lease = Some((token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release_flush_lease(&self, token: &str) -> BufferResult<()> {
        let mut lease = self.lease.lock();
        if lease.as_ref().is_some_and(|(held, _)| held == token) {
            *lease = None;
        }
        Ok(())
    }
}
