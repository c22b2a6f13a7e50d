//! Redis list-backed event buffer.

use super::service::{BufferResult, EventBuffer, lease_token};
use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};
use std::time::Duration;

const BUFFER_KEY: &str = "clicks:buffer";
const COUNTER_PREFIX: &str = "clicks:count:";
const LEASE_KEY: &str = "clicks:flush:lock";

/// Deletes the lease only if it still carries the caller's token.
const RELEASE_LEASE: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

/// Event buffer stored in a single Redis list.
///
/// `RPUSH` appends to the tail, `LRANGE 0 n-1` peeks at the head and
/// `LTRIM n -1` drops the persisted prefix, so events pushed concurrently with
/// a drain survive the trim. Drains from every process serialize on the
/// `clicks:flush:lock` key (`SET NX PX` with a random token).
pub struct RedisEventBuffer {
    client: ConnectionManager,
    key: String,
}

impl RedisEventBuffer {
    pub fn new(client: ConnectionManager) -> Self {
        Self {
            client,
            key: BUFFER_KEY.to_string(),
        }
    }

    fn counter_key(link_id: i64) -> String {
        format!("{}{}", COUNTER_PREFIX, link_id)
    }
}

#[async_trait]
impl EventBuffer for RedisEventBuffer {
    async fn push(&self, payload: &str) -> BufferResult<()> {
        let mut conn = self.client.clone();
        conn.rpush::<_, _, i64>(&self.key, payload).await?;
        Ok(())
    }

    async fn push_many(&self, payloads: &[String]) -> BufferResult<()> {
        if payloads.is_empty() {
            return Ok(());
        }
        let mut conn = self.client.clone();
        conn.rpush::<_, _, i64>(&self.key, payloads).await?;
        Ok(())
    }

    async fn peek(&self, count: usize) -> BufferResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.clone();
        let stop = isize::try_from(count).unwrap_or(isize::MAX) - 1;
        Ok(conn.lrange::<_, Vec<String>>(&self.key, 0, stop).await?)
    }

    async fn trim(&self, count: usize) -> BufferResult<()> {
        if count == 0 {
            return Ok(());
        }
        let mut conn = self.client.clone();
        let start = isize::try_from(count).unwrap_or(isize::MAX);
        conn.ltrim::<_, ()>(&self.key, start, -1).await?;
        Ok(())
    }

    async fn len(&self) -> BufferResult<usize> {
        let mut conn = self.client.clone();
        Ok(conn.llen::<_, usize>(&self.key).await?)
    }

    async fn incr_counter(&self, link_id: i64) -> BufferResult<i64> {
        let mut conn = self.client.clone();
        Ok(conn
            .incr::<_, _, i64>(Self::counter_key(link_id), 1)
            .await?)
    }

    async fn incr_counters(&self, link_ids: &[i64]) -> BufferResult<()> {
        if link_ids.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for &link_id in link_ids {
            pipe.incr(Self::counter_key(link_id), 1).ignore();
        }
        let mut conn = self.client.clone();
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn counter(&self, link_id: i64) -> BufferResult<Option<i64>> {
        let mut conn = self.client.clone();
        Ok(conn
            .get::<_, Option<i64>>(Self::counter_key(link_id))
            .await?)
    }

    async fn acquire_flush_lease(&self, ttl: Duration) -> BufferResult<Option<String>> {
        let token = lease_token();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.client.clone();

        let acquired: Option<String> = redis::cmd("SET")
            .arg(LEASE_KEY)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        Ok(acquired.map(|_| token))
    }

    async fn release_flush_lease(&self, token: &str) -> BufferResult<()> {
        let mut conn = self.client.clone();
        Script::new(RELEASE_LEASE)
            .key(LEASE_KEY)
            .arg(token)
            .invoke_async::<i64>(&mut conn)
            .await?;
        Ok(())
    }
}
