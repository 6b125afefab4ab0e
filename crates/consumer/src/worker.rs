//! Worker - one consumer task of a shard pool
//!
//! Loop: wait for cancellation or the next delivery. Each delivery is pushed
//! into the shard's shared buffer, acked, and triggers a flush once the size
//! observed by that push reaches the threshold. Every exit path ends with one
//! final flush of whatever the buffer still holds.

use std::fmt;
use std::sync::Arc;

use contracts::{ArtifactStore, Delivery, DeliveryStream, WorkerId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::buffer::BatchBuffer;
use crate::flush::{flush, FlushOutcome};
use crate::metrics::ShardMetrics;
use crate::shutdown::CompletionGuard;

/// Why a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Cancellation signal observed
    Cancelled,
    /// Broker closed the delivery stream
    StreamClosed,
    /// Broker rejected an acknowledgment
    AckFailed { tag: u64 },
}

impl fmt::Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::StreamClosed => write!(f, "stream closed"),
            Self::AckFailed { tag } => write!(f, "ack failed (tag {tag})"),
        }
    }
}

/// Final report of a finished worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub id: WorkerId,
    pub exit: WorkerExit,
    /// Deliveries this worker pushed into the buffer
    pub received: u64,
    /// Non-empty flushes this worker wrote
    pub flushes: u64,
    /// Payload count of each written flush, in order
    pub batch_sizes: Vec<usize>,
}

pub struct Worker<S> {
    id: WorkerId,
    buffer: Arc<BatchBuffer>,
    stream: DeliveryStream,
    store: Arc<S>,
    flush_threshold: usize,
    metrics: Arc<ShardMetrics>,
    received: u64,
    batch_sizes: Vec<usize>,
}

impl<S> Worker<S>
where
    S: ArtifactStore + Send + Sync + 'static,
{
    pub fn new(
        id: WorkerId,
        buffer: Arc<BatchBuffer>,
        stream: DeliveryStream,
        store: Arc<S>,
        flush_threshold: usize,
        metrics: Arc<ShardMetrics>,
    ) -> Self {
        Self {
            id,
            buffer,
            stream,
            store,
            flush_threshold: flush_threshold.max(1),
            metrics,
            received: 0,
            batch_sizes: Vec::new(),
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Run until cancelled, the stream closes, or an ack fails.
    ///
    /// `completion` is held for the whole run and released on return (or on
    /// unwind), so the coordinator always sees this worker finish.
    #[instrument(name = "worker_loop", skip_all, fields(worker = %self.id))]
    pub async fn run(mut self, cancel: CancellationToken, completion: CompletionGuard) -> WorkerReport {
        let _completion = completion;
        debug!("Worker started");

        let exit = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break WorkerExit::Cancelled,

                next = self.stream.recv() => match next {
                    Ok(delivery) => {
                        if let Err(exit) = self.handle(delivery).await {
                            break exit;
                        }
                    }
                    Err(_) => {
                        warn!("Delivery stream closed");
                        break WorkerExit::StreamClosed;
                    }
                },
            }
        };

        // Final drain; finds nothing when a sibling got there first.
        if self.flush_buffer().await.is_written() {
            debug!("Final flush wrote remaining payloads");
        }

        info!(
            exit = %exit,
            received = self.received,
            flushes = self.batch_sizes.len(),
            "Worker stopped"
        );

        WorkerReport {
            id: self.id,
            exit,
            received: self.received,
            flushes: self.batch_sizes.len() as u64,
            batch_sizes: self.batch_sizes,
        }
    }

    async fn handle(&mut self, delivery: Delivery) -> Result<(), WorkerExit> {
        let size = self.buffer.push(delivery.body.clone());
        self.received += 1;
        self.metrics.inc_received();
        observability::record_payload_received(self.id.shard);
        observability::record_buffer_depth(self.id.shard, size);

        // Acked as soon as it is buffered, before it is durable.
        if let Err(e) = delivery.ack() {
            self.metrics.inc_ack_failures();
            observability::record_ack_failure(self.id.shard);
            error!(tag = delivery.tag, error = %e, "Ack failed, leaving consume loop");
            return Err(WorkerExit::AckFailed { tag: delivery.tag });
        }
        self.metrics.inc_acked();

        if size >= self.flush_threshold {
            self.flush_buffer().await;
        }
        Ok(())
    }

    async fn flush_buffer(&mut self) -> FlushOutcome {
        let outcome = flush(&self.buffer, self.id, self.store.as_ref(), &self.metrics).await;
        if let FlushOutcome::Written { payloads, .. } = &outcome {
            self.batch_sizes.push(*payloads);
            observability::record_buffer_depth(self.id.shard, self.buffer.size());
        }
        outcome
    }
}
