//! Click event enqueue and live counters.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::errors::EnqueueError;
use crate::infrastructure::buffer::{BufferError, EventBuffer};

/// Appends click events to the shared buffer and bumps the live counter.
///
/// Enqueueing is best-effort: a failed or slow buffer drops the event with a
/// warning and a `clicks_dropped_total` increment. Callers on the request path
/// never wait on this service directly; see
/// [`crate::domain::click_forwarder::run_click_forwarder`].
pub struct ClickService {
    buffer: Arc<dyn EventBuffer>,
    enqueue_timeout: Duration,
}

impl ClickService {
    pub fn new(buffer: Arc<dyn EventBuffer>, enqueue_timeout: Duration) -> Self {
        Self {
            buffer,
            enqueue_timeout,
        }
    }

    /// Appends `event` to the buffer and increments its link's live counter.
    ///
    /// Both writes are attempted even if one of them fails. Only the append
    /// decides the outcome; a failed counter increment is logged.
    pub async fn record(&self, event: &ClickEvent) -> Result<(), EnqueueError> {
        let payload = match event.to_payload() {
            Ok(payload) => payload,
            Err(e) => return Err(dropped(event.link_id, e.to_string())),
        };

        let (pushed, counted) = tokio::join!(
            timeout(self.enqueue_timeout, self.buffer.push(&payload)),
            timeout(self.enqueue_timeout, self.buffer.incr_counter(event.link_id)),
        );

        match counted {
            Ok(Ok(count)) => debug!(link_id = event.link_id, count, "Live counter incremented"),
            Ok(Err(e)) => warn!(link_id = event.link_id, error = %e, "Failed to increment live counter"),
            Err(_) => warn!(link_id = event.link_id, "Live counter increment timed out"),
        }

        match pushed {
            Ok(Ok(())) => {
                metrics::counter!("clicks_enqueued_total").increment(1);
                Ok(())
            }
            Ok(Err(e)) => Err(dropped(event.link_id, e.to_string())),
            Err(_) => Err(dropped(event.link_id, "enqueue timed out".to_string())),
        }
    }

    /// Appends a batch of events with one buffer write and one counter round
    /// trip, keeping their order.
    ///
    /// Returns the number of events appended. Events that were not appended
    /// are logged and counted as dropped.
    pub async fn record_batch(&self, events: &[ClickEvent]) -> usize {
        let mut payloads = Vec::with_capacity(events.len());
        let mut link_ids = Vec::with_capacity(events.len());
        for event in events {
            match event.to_payload() {
                Ok(payload) => {
                    payloads.push(payload);
                    link_ids.push(event.link_id);
                }
                Err(e) => {
                    dropped(event.link_id, e.to_string());
                }
            }
        }

        if payloads.is_empty() {
            return 0;
        }

        let (pushed, counted) = tokio::join!(
            timeout(self.enqueue_timeout, self.buffer.push_many(&payloads)),
            timeout(self.enqueue_timeout, self.buffer.incr_counters(&link_ids)),
        );

        match counted {
            Ok(Ok(())) => debug!(events = link_ids.len(), "Live counters incremented"),
            Ok(Err(e)) => warn!(events = link_ids.len(), error = %e, "Failed to increment live counters"),
            Err(_) => warn!(events = link_ids.len(), "Live counter increments timed out"),
        }

        let reason = match pushed {
            Ok(Ok(())) => {
                metrics::counter!("clicks_enqueued_total").increment(link_ids.len() as u64);
                return link_ids.len();
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => "enqueue timed out".to_string(),
        };

        for link_id in link_ids {
            dropped(link_id, reason.clone());
        }
        0
    }

    /// Clicks counted for a link since the counter was created, including
    /// clicks not yet flushed. Approximate; `None` if never clicked.
    pub async fn realtime_count(&self, link_id: i64) -> Result<Option<i64>, BufferError> {
        self.buffer.counter(link_id).await
    }

    /// Number of events waiting to be flushed.
    pub async fn pending(&self) -> Result<usize, BufferError> {
        self.buffer.len().await
    }
}

/// Logs and counts a dropped event.
pub(crate) fn dropped(link_id: i64, reason: String) -> EnqueueError {
    warn!(link_id, reason = %reason, "Click event dropped");
    metrics::counter!("clicks_dropped_total").increment(1);
    EnqueueError::Dropped { link_id, reason }
}
