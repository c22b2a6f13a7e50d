//! Background forwarder from the redirect path into the event buffer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::services::ClickService;
use crate::application::services::click_service::dropped;
use crate::domain::click_event::ClickEvent;
use crate::domain::errors::EnqueueError;

/// Hands a click to the forwarder without waiting.
///
/// A full or closed channel drops the click; the drop is logged and counted.
pub fn try_dispatch(
    sender: &mpsc::Sender<ClickEvent>,
    event: ClickEvent,
) -> Result<(), EnqueueError> {
    let link_id = event.link_id;
    match sender.try_send(event) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err(dropped(link_id, "click queue full".to_string())),
        Err(TrySendError::Closed(_)) => Err(dropped(link_id, "click queue closed".to_string())),
    }
}

/// Most events appended to the buffer in one write.
pub const FORWARD_BATCH: usize = 256;

/// Consumes click events from the bounded channel and appends them to the
/// event buffer.
///
/// Everything queued while the previous write was in flight goes out in the
/// next one (up to [`FORWARD_BATCH`]), so throughput grows with load instead of
/// being capped at one buffer round trip per click. Order is preserved.
///
/// Runs until every sender is dropped. Failures are logged and counted inside
/// [`ClickService::record_batch`]; the forwarder itself never stops on them.
pub async fn run_click_forwarder(rx: mpsc::Receiver<ClickEvent>, clicks: Arc<ClickService>) {
    forward(rx, clicks, std::future::pending()).await;
}

/// A spawned forwarder that can be abandoned at shutdown.
pub struct ForwarderHandle {
    task: JoinHandle<usize>,
    abandon: oneshot::Sender<()>,
}

/// Spawns [`run_click_forwarder`] behind a [`ForwarderHandle`].
pub fn spawn_click_forwarder(
    rx: mpsc::Receiver<ClickEvent>,
    clicks: Arc<ClickService>,
) -> ForwarderHandle {
    let (abandon, abandoned) = oneshot::channel();
    let stop = async move {
        // A dropped handle keeps the forwarder running.
        if abandoned.await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    ForwarderHandle {
        task: tokio::spawn(forward(rx, clicks, stop)),
        abandon,
    }
}

impl ForwarderHandle {
    /// Waits up to `deadline` for the forwarder to empty the closed channel.
    ///
    /// On timeout the forwarder is told to stop and the number of events it
    /// never delivered is returned. Zero means everything was forwarded.
    pub async fn finish(self, deadline: Duration) -> usize {
        let ForwarderHandle { mut task, abandon } = self;

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(abandoned)) => return abandoned,
            Ok(Err(e)) => {
                warn!("Click forwarder task failed: {}", e);
                return 0;
            }
            Err(_) => {}
        }

        let _ = abandon.send(());
        match task.await {
            Ok(abandoned) => abandoned,
            Err(e) => {
                warn!("Click forwarder task failed: {}", e);
                0
            }
        }
    }
}

/// Forwards until the channel closes or `stop` fires, returning the number of
/// events left undelivered.
async fn forward(
    mut rx: mpsc::Receiver<ClickEvent>,
    clicks: Arc<ClickService>,
    stop: impl Future<Output = ()>,
) -> usize {
    tokio::pin!(stop);
    let mut batch = Vec::with_capacity(FORWARD_BATCH);

    loop {
        tokio::select! {
            _ = &mut stop => return rx.len(),
            received = rx.recv_many(&mut batch, FORWARD_BATCH) => {
                if received == 0 {
                    break;
                }
            }
        }

        tokio::select! {
            _ = &mut stop => return batch.len() + rx.len(),
            _ = clicks.record_batch(&batch) => batch.clear(),
        }
    }

    info!("Click channel closed, forwarder stopped");
    0
}
