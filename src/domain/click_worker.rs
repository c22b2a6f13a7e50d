//! Periodic flush of buffered click events into durable storage.
//!
//! A single [`ClickWorker`] owns the consumer side of the event buffer. On each
//! tick it drains the buffer in batches: peek from the head, enrich, insert the
//! batch in one statement, and only then trim what was read. A failed insert
//! leaves the batch in place for the next tick, so delivery is at-least-once.
//!
//! Every drain first takes the buffer's flush lease. Other server instances
//! and `linkpulse-admin buffer flush` take the same lease, so at most one
//! drain reads and trims the buffer at a time; a drain that finds the lease
//! held skips its turn.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, timeout};
use tracing::{debug, error, info, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::NewClick;
use crate::domain::repositories::ClickRepository;
use crate::infrastructure::buffer::EventBuffer;
use crate::infrastructure::enrichment::Enricher;

/// Flush cadence and bounds.
#[derive(Debug, Clone)]
pub struct FlushConfig {
    /// Time between the end of one tick and the next.
    pub interval: Duration,
    /// Events read per batch; also the size of one insert statement.
    pub batch_size: usize,
    /// Deadline for a whole drain.
    pub cycle_timeout: Duration,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            batch_size: 100,
            cycle_timeout: Duration::from_secs(30),
        }
    }
}

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainOutcome {
    /// The buffer was emptied or a short batch was read.
    #[default]
    Drained,
    /// Reading the head of the buffer failed.
    BufferUnavailable,
    /// The batch insert failed; the batch stays in the buffer.
    InsertFailed,
    /// Rows were inserted but the buffer could not be trimmed.
    TrimFailed,
    /// The drain did not finish within the cycle deadline.
    TimedOut,
    /// Another drain holds the flush lease; nothing was read.
    Busy,
}

/// Summary of one drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Batches inserted and trimmed.
    pub batches: usize,
    /// Events removed from the buffer.
    pub read: usize,
    /// Rows written to storage.
    pub inserted: u64,
    /// Malformed events removed without being stored.
    pub discarded: usize,
    pub outcome: DrainOutcome,
}

/// Lease lifetime beyond the cycle deadline, so a drain never outlives its lease.
const LEASE_GRACE: Duration = Duration::from_secs(5);

/// The single consumer of the event buffer.
pub struct ClickWorker {
    buffer: Arc<dyn EventBuffer>,
    clicks: Arc<dyn ClickRepository>,
    enricher: Arc<Enricher>,
    config: FlushConfig,
}

/// Handle to a running [`ClickWorker`].
pub struct ClickWorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<DrainReport>,
}

impl ClickWorkerHandle {
    /// Signals the worker to stop and waits for its final drain.
    ///
    /// A drain already in progress completes first. Returns the report of the
    /// final drain, or `None` if the worker task panicked.
    pub async fn stop(self) -> Option<DrainReport> {
        let _ = self.stop_tx.send(());
        match self.join.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!(error = %e, "Click worker task failed");
                None
            }
        }
    }
}

impl ClickWorker {
    pub fn new(
        buffer: Arc<dyn EventBuffer>,
        clicks: Arc<dyn ClickRepository>,
        enricher: Arc<Enricher>,
        config: FlushConfig,
    ) -> Self {
        Self {
            buffer,
            clicks,
            enricher,
            config,
        }
    }

    /// Spawns the flush loop. The first tick fires one interval from now.
    pub fn start(self) -> ClickWorkerHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(self.run(stop_rx));
        ClickWorkerHandle { stop_tx, join }
    }

    async fn run(self, mut stop_rx: oneshot::Receiver<()>) -> DrainReport {
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "Click worker started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush().await;
                }
                _ = &mut stop_rx => break,
            }
        }

        info!("Click worker stopping, running final drain");
        let report = self.flush().await;
        info!(
            read = report.read,
            inserted = report.inserted,
            outcome = ?report.outcome,
            "Click worker stopped"
        );
        report
    }

    /// Runs one drain bounded by the cycle deadline, holding the flush lease.
    pub async fn flush(&self) -> DrainReport {
        let mut report = DrainReport::default();

        let lease_ttl = self.config.cycle_timeout + LEASE_GRACE;
        let token = match self.buffer.acquire_flush_lease(lease_ttl).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("Another drain holds the flush lease, skipping");
                report.outcome = DrainOutcome::Busy;
                return report;
            }
            Err(e) => {
                warn!(error = %e, "Failed to take the flush lease");
                metrics::counter!("click_flush_failures_total").increment(1);
                report.outcome = DrainOutcome::BufferUnavailable;
                return report;
            }
        };

        if timeout(self.config.cycle_timeout, self.drain(&mut report))
            .await
            .is_err()
        {
            report.outcome = DrainOutcome::TimedOut;
            metrics::counter!("click_flush_failures_total").increment(1);
            warn!(
                timeout_secs = self.config.cycle_timeout.as_secs(),
                read = report.read,
                "Click flush timed out"
            );
        }

        if report.read > 0 {
            info!(
                batches = report.batches,
                read = report.read,
                inserted = report.inserted,
                discarded = report.discarded,
                "Flushed click events"
            );
        } else {
            debug!(outcome = ?report.outcome, "Click flush found nothing to write");
        }

        if let Err(e) = self.buffer.release_flush_lease(&token).await {
            warn!(error = %e, "Failed to release the flush lease, it will expire");
        }

        report
    }

    async fn drain(&self, report: &mut DrainReport) {
        let batch_size = self.config.batch_size;

        loop {
            let payloads = match self.buffer.peek(batch_size).await {
                Ok(payloads) => payloads,
                Err(e) => {
                    warn!(error = %e, "Failed to read event buffer");
                    metrics::counter!("click_flush_failures_total").increment(1);
                    report.outcome = DrainOutcome::BufferUnavailable;
                    return;
                }
            };

            if payloads.is_empty() {
                return;
            }

            let read = payloads.len();
            let (clicks, discarded) = self.decode(&payloads);

            if !clicks.is_empty() {
                let rows = clicks.len();
                match self.clicks.batch_insert(clicks).await {
                    Ok(inserted) => {
                        report.inserted += inserted;
                        metrics::counter!("clicks_flushed_total").increment(inserted);
                    }
                    Err(e) => {
                        error!(error = %e, rows, "Failed to insert click batch, will retry");
                        metrics::counter!("click_flush_failures_total").increment(1);
                        report.outcome = DrainOutcome::InsertFailed;
                        return;
                    }
                }
            }

            if let Err(e) = self.buffer.trim(read).await {
                error!(error = %e, read, "Failed to trim event buffer after insert");
                metrics::counter!("click_flush_failures_total").increment(1);
                report.outcome = DrainOutcome::TrimFailed;
                return;
            }

            report.batches += 1;
            report.read += read;
            report.discarded += discarded;
            if discarded > 0 {
                metrics::counter!("clicks_malformed_total").increment(discarded as u64);
            }

            if read < batch_size {
                return;
            }
        }
    }

    /// Parses and enriches a batch; returns the records and the number of
    /// malformed payloads skipped.
    fn decode(&self, payloads: &[String]) -> (Vec<NewClick>, usize) {
        let mut clicks = Vec::with_capacity(payloads.len());
        let mut discarded = 0;

        for raw in payloads {
            match ClickEvent::from_payload(raw) {
                Ok(event) => clicks.push(self.enricher.enrich(event)),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed click event");
                    discarded += 1;
                }
            }
        }

        (clicks, discarded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockClickRepository, RepositoryError};
    use crate::infrastructure::buffer::{BufferError, MemoryEventBuffer, MockEventBuffer};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload(link_id: i64) -> String {
        ClickEvent::new(link_id, "hash".to_string(), "", "Mozilla/5.0", "")
            .to_payload()
            .unwrap()
    }

    async fn filled_buffer(count: i64) -> Arc<MemoryEventBuffer> {
        let buffer = Arc::new(MemoryEventBuffer::new());
        for link_id in 0..count {
            buffer.push(&payload(link_id)).await.unwrap();
        }
        buffer
    }

    fn recording_repository(sizes: Arc<Mutex<Vec<usize>>>) -> MockClickRepository {
        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().returning(move |clicks| {
            sizes.lock().push(clicks.len());
            Ok(clicks.len() as u64)
        });
        repo
    }

    fn worker(
        buffer: Arc<dyn EventBuffer>,
        repo: impl ClickRepository + 'static,
        batch_size: usize,
    ) -> ClickWorker {
        ClickWorker::new(
            buffer,
            Arc::new(repo),
            Arc::new(Enricher::without_geoip()),
            FlushConfig {
                interval: Duration::from_secs(30),
                batch_size,
                cycle_timeout: Duration::from_secs(30),
            },
        )
    }

    #[tokio::test]
    async fn test_flush_drains_in_bounded_batches() {
        let buffer = filled_buffer(250).await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let worker = worker(buffer.clone(), recording_repository(sizes.clone()), 100);

        let report = worker.flush().await;

        assert_eq!(*sizes.lock(), vec![100, 100, 50]);
        assert_eq!(buffer.len().await.unwrap(), 0);
        assert_eq!(report.batches, 3);
        assert_eq!(report.read, 250);
        assert_eq!(report.inserted, 250);
        assert_eq!(report.outcome, DrainOutcome::Drained);
    }

    #[tokio::test]
    async fn test_flush_exact_multiple_reads_until_empty() {
        let buffer = filled_buffer(200).await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let worker = worker(buffer.clone(), recording_repository(sizes.clone()), 100);

        let report = worker.flush().await;

        assert_eq!(*sizes.lock(), vec![100, 100]);
        assert_eq!(report.read, 200);
        assert_eq!(buffer.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_flush_keeps_fifo_order() {
        let buffer = filled_buffer(5).await;
        let ids = Arc::new(Mutex::new(Vec::new()));
        let seen = ids.clone();

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().returning(move |clicks| {
            seen.lock().extend(clicks.iter().map(|c| c.link_id));
            Ok(clicks.len() as u64)
        });

        worker(buffer, repo, 2).flush().await;

        assert_eq!(*ids.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_batch_for_next_cycle() {
        let buffer = filled_buffer(50).await;
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().returning(move |clicks| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(clicks.len() as u64)
            }
        });

        let worker = worker(buffer.clone(), repo, 100);

        let first = worker.flush().await;
        assert_eq!(first.outcome, DrainOutcome::InsertFailed);
        assert_eq!(first.read, 0);
        assert_eq!(buffer.len().await.unwrap(), 50);

        let second = worker.flush().await;
        assert_eq!(second.outcome, DrainOutcome::Drained);
        assert_eq!(second.inserted, 50);
        assert_eq!(buffer.len().await.unwrap(), 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_malformed_events_are_discarded() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        buffer.push("not json").await.unwrap();
        buffer.push(&payload(1)).await.unwrap();
        buffer.push("{}").await.unwrap();
        buffer.push(&payload(2)).await.unwrap();

        let sizes = Arc::new(Mutex::new(Vec::new()));
        let worker = worker(buffer.clone(), recording_repository(sizes.clone()), 100);

        let report = worker.flush().await;

        assert_eq!(*sizes.lock(), vec![2]);
        assert_eq!(report.read, 4);
        assert_eq!(report.discarded, 2);
        assert_eq!(buffer.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_of_only_malformed_events_is_trimmed_without_insert() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        buffer.push("garbage").await.unwrap();
        buffer.push("\"just a string\"").await.unwrap();

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().times(0);

        let report = worker(buffer.clone(), repo, 100).flush().await;

        assert_eq!(report.discarded, 2);
        assert_eq!(report.inserted, 0);
        assert_eq!(buffer.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_enrichment_fills_browser_and_device() {
        let buffer = filled_buffer(1).await;
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().returning(move |clicks| {
            let n = clicks.len() as u64;
            sink.lock().extend(clicks);
            Ok(n)
        });

        worker(buffer, repo, 100).flush().await;

        let clicks = captured.lock();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].ip_hash, "hash");
        assert_eq!(clicks[0].country, "");
        assert!(!clicks[0].browser.is_empty());
        assert!(!clicks[0].device_type.is_empty());
    }

    fn leased_mock() -> MockEventBuffer {
        let mut buffer = MockEventBuffer::new();
        buffer
            .expect_acquire_flush_lease()
            .returning(|_| Ok(Some("token".to_string())));
        buffer
            .expect_release_flush_lease()
            .times(1)
            .returning(|_| Ok(()));
        buffer
    }

    #[tokio::test]
    async fn test_buffer_read_failure_is_reported() {
        let mut buffer = leased_mock();
        buffer
            .expect_peek()
            .returning(|_| Err(BufferError::Operation("connection refused".to_string())));
        buffer.expect_trim().times(0);

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().times(0);

        let report = worker(Arc::new(buffer), repo, 100).flush().await;

        assert_eq!(report.outcome, DrainOutcome::BufferUnavailable);
    }

    #[tokio::test]
    async fn test_trim_failure_stops_drain() {
        let mut buffer = leased_mock();
        buffer
            .expect_peek()
            .times(1)
            .returning(|_| Ok(vec![payload(1), payload(2)]));
        buffer
            .expect_trim()
            .times(1)
            .returning(|_| Err(BufferError::Operation("READONLY".to_string())));

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert()
            .times(1)
            .returning(|clicks| Ok(clicks.len() as u64));

        let report = worker(Arc::new(buffer), repo, 2).flush().await;

        assert_eq!(report.outcome, DrainOutcome::TrimFailed);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.read, 0);
    }

    struct StalledRepository;

    #[async_trait]
    impl ClickRepository for StalledRepository {
        async fn batch_insert(&self, _clicks: Vec<NewClick>) -> Result<u64, RepositoryError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_is_bounded_by_cycle_deadline() {
        let buffer = filled_buffer(10).await;
        let worker = ClickWorker::new(
            buffer.clone(),
            Arc::new(StalledRepository),
            Arc::new(Enricher::without_geoip()),
            FlushConfig {
                interval: Duration::from_secs(30),
                batch_size: 100,
                cycle_timeout: Duration::from_secs(5),
            },
        );

        let report = worker.flush().await;

        assert_eq!(report.outcome, DrainOutcome::TimedOut);
        assert_eq!(buffer.len().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_stop_drains_pending_events() {
        let buffer = Arc::new(MemoryEventBuffer::new());
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let mut worker = worker(buffer.clone(), recording_repository(sizes.clone()), 100);
        worker.config.interval = Duration::from_secs(3600);

        let handle = worker.start();
        for link_id in 0..5 {
            buffer.push(&payload(link_id)).await.unwrap();
        }

        let report = handle.stop().await.unwrap();

        assert_eq!(report.read, 5);
        assert_eq!(*sizes.lock(), vec![5]);
        assert_eq!(buffer.len().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_flushes_on_tick() {
        let buffer = filled_buffer(5).await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let handle = worker(buffer.clone(), recording_repository(sizes.clone()), 100).start();

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(*sizes.lock(), vec![5]);
        assert_eq!(buffer.len().await.unwrap(), 0);

        let report = handle.stop().await.unwrap();
        assert_eq!(report.read, 0);
    }

    /// Memory buffer whose reads take a network round trip.
    struct SlowBuffer {
        inner: MemoryEventBuffer,
        latency: Duration,
    }

    #[async_trait]
    impl EventBuffer for SlowBuffer {
        async fn push(&self, payload: &str) -> Result<(), BufferError> {
            self.inner.push(payload).await
        }

        async fn peek(&self, count: usize) -> Result<Vec<String>, BufferError> {
            tokio::time::sleep(self.latency).await;
            self.inner.peek(count).await
        }

        async fn trim(&self, count: usize) -> Result<(), BufferError> {
            self.inner.trim(count).await
        }

        async fn len(&self) -> Result<usize, BufferError> {
            self.inner.len().await
        }

        async fn incr_counter(&self, link_id: i64) -> Result<i64, BufferError> {
            self.inner.incr_counter(link_id).await
        }

        async fn counter(&self, link_id: i64) -> Result<Option<i64>, BufferError> {
            self.inner.counter(link_id).await
        }

        async fn acquire_flush_lease(&self, ttl: Duration) -> Result<Option<String>, BufferError> {
            self.inner.acquire_flush_lease(ttl).await
        }

        async fn release_flush_lease(&self, token: &str) -> Result<(), BufferError> {
            self.inner.release_flush_lease(token).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_flushes_never_lose_events() {
        let buffer = Arc::new(SlowBuffer {
            inner: MemoryEventBuffer::new(),
            latency: Duration::from_millis(10),
        });
        for link_id in 0..30 {
            buffer.push(&payload(link_id)).await.unwrap();
        }

        let ids = Arc::new(Mutex::new(Vec::new()));
        let repository = |ids: Arc<Mutex<Vec<i64>>>| {
            let mut repo = MockClickRepository::new();
            repo.expect_batch_insert().returning(move |clicks| {
                ids.lock().extend(clicks.iter().map(|c| c.link_id));
                Ok(clicks.len() as u64)
            });
            repo
        };
        let first = worker(buffer.clone(), repository(ids.clone()), 10);
        let second = worker(buffer.clone(), repository(ids.clone()), 10);

        let (a, b) = tokio::join!(first.flush(), second.flush());

        let mut outcomes = [a.outcome, b.outcome];
        outcomes.sort_by_key(|o| *o == DrainOutcome::Busy);
        assert_eq!(outcomes, [DrainOutcome::Drained, DrainOutcome::Busy]);
        assert_eq!(a.read + b.read, 30);
        assert_eq!(buffer.len().await.unwrap(), 0);

        let mut stored = ids.lock().clone();
        stored.sort_unstable();
        assert_eq!(stored, (0..30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_flush_skips_while_lease_is_held() {
        let buffer = filled_buffer(3).await;
        let token = buffer
            .acquire_flush_lease(Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().times(0);
        let worker = worker(buffer.clone(), repo, 100);

        let report = worker.flush().await;
        assert_eq!(report.outcome, DrainOutcome::Busy);
        assert_eq!(buffer.len().await.unwrap(), 3);

        buffer.release_flush_lease(&token).await.unwrap();
        assert!(buffer.acquire_flush_lease(Duration::from_secs(60)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_flush_releases_lease_for_next_drain() {
        let buffer = filled_buffer(2).await;
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let worker = worker(buffer.clone(), recording_repository(sizes.clone()), 100);

        worker.flush().await;

        assert!(
            buffer
                .acquire_flush_lease(Duration::from_secs(60))
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_lease_failure_is_reported() {
        let mut buffer = MockEventBuffer::new();
        buffer
            .expect_acquire_flush_lease()
            .returning(|_| Err(BufferError::Operation("connection refused".to_string())));
        buffer.expect_peek().times(0);
        buffer.expect_release_flush_lease().times(0);

        let mut repo = MockClickRepository::new();
        repo.expect_batch_insert().times(0);

        let report = worker(Arc::new(buffer), repo, 100).flush().await;

        assert_eq!(report.outcome, DrainOutcome::BufferUnavailable);
    }
}
