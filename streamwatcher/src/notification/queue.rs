//! Notification queue and worker.
//!
//! Events are delivered to the sink one at a time, in the order they were
//! enqueued. Enqueueing never blocks; a full queue drops the event.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::sink::NotificationSink;
use super::types::WatchEvent;

pub const QUEUE_CAPACITY: usize = 100;

pub struct NotificationQueue {
    tx: mpsc::Sender<WatchEvent>,
    closed: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl NotificationQueue {
    /// Start the worker task. Must be called inside a tokio runtime.
    pub fn start(sink: Arc<dyn NotificationSink>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let closed = CancellationToken::new();
        let worker = tokio::spawn(worker_loop(sink, rx, closed.clone()));
        tracing::info!("Notification queue worker started");
        Self {
            tx,
            closed,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Sender handle for producers such as the poller.
    pub fn sender(&self) -> mpsc::Sender<WatchEvent> {
        self.tx.clone()
    }

    pub fn enqueue(&self, event: WatchEvent) -> Result<(), String> {
        self.tx
            .try_send(event)
            .map_err(|e| format!("Notification queue full or closed: {e}"))
    }

    /// Stop the worker after it delivers what is already queued.
    pub async fn close(&self) {
        self.closed.cancel();
        let worker = self.worker.lock().await.take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::warn!("Notification worker ended abnormally: {e}");
            }
        }
    }
}

async fn worker_loop(
    sink: Arc<dyn NotificationSink>,
    mut rx: mpsc::Receiver<WatchEvent>,
    closed: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = closed.cancelled() => break,
            event = rx.recv() => match event {
                Some(event) => sink.deliver(&event).await,
                None => break,
            },
        }
    }

    rx.close();
    while let Ok(event) = rx.try_recv() {
        sink.deliver(&event).await;
    }
    tracing::info!("Notification queue worker stopped");
}
