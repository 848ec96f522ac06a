//! Durable sink: serialized persistence of product batches.
//!
//! Arbitrarily many concurrent searches produce batches; exactly one
//! background worker writes them, so the storage layer never sees two
//! writers at once. `DirectSink` offers the same `persist` contract
//! without the queue for callers that want synchronous writes; both
//! paths share the repository's insert-if-absent-by-url idempotency.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::product::ProductRecord;
use crate::domain::services::{ProductSink, SinkError};
use crate::infrastructure::product_repository::ProductRepository;

enum WriterMessage {
    Batch(Vec<ProductRecord>),
    Shutdown(oneshot::Sender<()>),
}

/// Single-writer background persistence queue.
pub struct DbWriter {
    tx: mpsc::UnboundedSender<WriterMessage>,
    rx_slot: Mutex<Option<mpsc::UnboundedReceiver<WriterMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    repository: ProductRepository,
}

impl DbWriter {
    pub fn new(repository: ProductRepository) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx_slot: Mutex::new(Some(rx)),
            worker: Mutex::new(None),
            repository,
        }
    }

    /// Start the background worker. Idempotent: once the worker owns the
    /// receiver, later calls return without spawning anything.
    pub fn start(&self) {
        let Some(rx) = self.rx_slot.lock().expect("rx slot lock poisoned").take() else {
            debug!("DbWriter worker already running");
            return;
        };

        info!("Starting DbWriter worker");
        let repository = self.repository.clone();
        let handle = tokio::spawn(Self::run(rx, repository));
        *self.worker.lock().expect("worker lock poisoned") = Some(handle);
    }

    /// Stop the worker after it has drained every batch enqueued before
    /// this call (the channel is FIFO, so the shutdown marker sorts after
    /// all pending work). A writer that was never started has no worker
    /// to drain and stops immediately.
    pub async fn stop(&self) {
        if self.rx_slot.lock().expect("rx slot lock poisoned").is_some() {
            debug!("DbWriter never started, nothing to stop");
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriterMessage::Shutdown(ack_tx)).is_err() {
            return; // worker already gone
        }
        let _ = ack_rx.await;

        let handle = self.worker.lock().expect("worker lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!("DbWriter stopped");
    }

    fn enqueue(&self, products: Vec<ProductRecord>) -> Result<(), Vec<ProductRecord>> {
        match self.tx.send(WriterMessage::Batch(products)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::SendError(WriterMessage::Batch(products))) => Err(products),
            Err(_) => unreachable!("only batches are re-extracted"),
        }
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<WriterMessage>, repository: ProductRepository) {
        info!("DbWriter worker running");
        while let Some(message) = rx.recv().await {
            match message {
                WriterMessage::Batch(batch) => {
                    let size = batch.len();
                    match repository.save_products(&batch).await {
                        Ok(inserted) => {
                            info!("DbWriter committed batch: {}/{} new rows", inserted, size);
                        }
                        Err(e) => {
                            // Batch-level failure (storage level). No retry by
                            // design; the records resurface on a later search.
                            error!("DbWriter failed to commit batch of {}: {}", size, e);
                        }
                    }
                }
                WriterMessage::Shutdown(ack) => {
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("DbWriter worker exiting");
    }
}

/// Queue-backed sink. Falls back to a synchronous direct write when the
/// worker is unavailable, with identical persistence semantics.
pub struct QueuedSink {
    writer: DbWriter,
}

impl QueuedSink {
    pub fn new(repository: ProductRepository) -> Self {
        let writer = DbWriter::new(repository);
        writer.start();
        Self { writer }
    }

    /// Drain and stop the background worker.
    pub async fn shutdown(&self) {
        self.writer.stop().await;
    }
}

#[async_trait]
impl ProductSink for QueuedSink {
    async fn persist(&self, products: Vec<ProductRecord>) -> Result<u64, SinkError> {
        let accepted = products.len() as u64;
        match self.writer.enqueue(products) {
            Ok(()) => {
                debug!("Enqueued batch of {} products", accepted);
                Ok(accepted)
            }
            Err(products) => {
                warn!("DbWriter queue unavailable, writing batch directly");
                Ok(self.writer.repository.save_products(&products).await?)
            }
        }
    }
}

/// Synchronous sink: same contract, no queue.
pub struct DirectSink {
    repository: ProductRepository,
}

impl DirectSink {
    pub fn new(repository: ProductRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ProductSink for DirectSink {
    async fn persist(&self, products: Vec<ProductRecord>) -> Result<u64, SinkError> {
        Ok(self.repository.save_products(&products).await?)
    }
}
