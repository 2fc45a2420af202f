//! Background event dispatcher
//!
//! Recorded events are enqueued on a bounded channel and flushed to an
//! [`EventSink`] by a background worker, either when a full batch
//! accumulates or when the flush interval elapses. Shutdown signals the
//! worker, which stops accepting new events, drains the channel, and
//! flushes whatever remains.

use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use traceline_core::Event;

/// Destination for flushed event batches
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver one batch of events
    ///
    /// Called from the worker task. Errors are logged and the batch is
    /// dropped; the sink is expected to have exhausted its own retries.
    async fn deliver(&self, events: Vec<Event>) -> Result<()>;
}

/// Dispatcher tuning knobs
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum events per transmitted batch
    pub batch_size: usize,

    /// Maximum time to wait before flushing a partial batch (milliseconds)
    pub batch_interval_ms: u64,

    /// Channel capacity; enqueueing beyond this drops the event
    pub queue_size: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            batch_interval_ms: 1000,
            queue_size: 512,
        }
    }
}

/// Clonable enqueue handle onto the dispatcher's channel
///
/// Enqueueing needs only `&self` and never blocks or takes a lock, so
/// concurrent callers do not contend with each other.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Enqueue an event for transmission (non-blocking)
    ///
    /// Returns `false` if the event was dropped: the queue is full, or the
    /// dispatcher has already shut down.
    pub fn enqueue(&self, event: Event) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Event queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("Event dispatcher closed, dropping event");
                false
            }
        }
    }
}

/// Batching dispatcher feeding a single sink
pub struct EventDispatcher {
    sender: EventSender,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl EventDispatcher {
    pub fn new(sink: Arc<dyn EventSink>, config: DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker_handle = tokio::spawn(async move {
            worker_loop(rx, shutdown_rx, sink, config).await;
        });

        Self {
            sender: EventSender { tx },
            shutdown_tx: Some(shutdown_tx),
            worker_handle: Some(worker_handle),
        }
    }

    /// A handle for enqueueing; clones share the same bounded channel
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Enqueue an event for transmission (non-blocking)
    ///
    /// Returns `false` if the queue is full and the event was dropped.
    pub fn enqueue(&self, event: Event) -> bool {
        self.sender.enqueue(event)
    }

    /// Shut down the dispatcher, draining and flushing pending events
    ///
    /// Live [`EventSender`] clones do not keep the worker alive: the worker
    /// stops accepting events the moment the signal lands.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // Ignoring error: the worker may already have exited
            let _ = shutdown_tx.send(());
        }

        if let Some(handle) = self.worker_handle.take() {
            handle.await.map_err(|_| {
                traceline_core::Error::Internal("Dispatcher worker panicked".to_string())
            })?;
        }

        tracing::debug!("Event dispatcher shutdown complete");
        Ok(())
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        // Dropping the shutdown sender makes the worker exit, but without
        // an explicit shutdown() nothing awaits its final flush.
        if self.worker_handle.is_some() {
            tracing::warn!(
                "EventDispatcher dropped without shutdown(); pending events may not be flushed"
            );
        }
    }
}

async fn worker_loop(
    mut rx: mpsc::Receiver<Event>,
    mut shutdown_rx: oneshot::Receiver<()>,
    sink: Arc<dyn EventSink>,
    config: DispatcherConfig,
) {
    let mut buffer: Vec<Event> = Vec::with_capacity(config.batch_size);
    let mut interval = tokio::time::interval(Duration::from_millis(config.batch_interval_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(event) => {
                    buffer.push(event);
                    if buffer.len() >= config.batch_size {
                        flush(&sink, &mut buffer).await;
                    }
                }
                None => {
                    // Every sender is gone: flush the remainder and exit
                    flush(&sink, &mut buffer).await;
                    break;
                }
            },
            _ = interval.tick() => {
                if !buffer.is_empty() {
                    flush(&sink, &mut buffer).await;
                }
            }
            _ = &mut shutdown_rx => {
                // Stop accepting sends, then drain what already arrived
                rx.close();
                while let Some(event) = rx.recv().await {
                    buffer.push(event);
                    if buffer.len() >= config.batch_size {
                        flush(&sink, &mut buffer).await;
                    }
                }
                flush(&sink, &mut buffer).await;
                break;
            }
        }
    }

    tracing::debug!("Event dispatcher worker exited");
}

async fn flush(sink: &Arc<dyn EventSink>, buffer: &mut Vec<Event>) {
    if buffer.is_empty() {
        return;
    }

    let events = std::mem::take(buffer);
    let count = events.len();

    if let Err(e) = sink.deliver(events).await {
        tracing::error!(error = %e, count, "Failed to deliver event batch");
    } else {
        tracing::debug!(count, "Delivered event batch");
    }
}
