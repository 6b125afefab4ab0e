//! ShardPool - the workers of one shard and their shared buffer

use std::sync::Arc;

use contracts::{ArtifactStore, DeliveryStream, ShardId, WorkerId};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::buffer::BatchBuffer;
use crate::metrics::ShardMetrics;
use crate::shutdown::ShutdownCoordinator;
use crate::worker::{Worker, WorkerReport};

/// Handle to the running workers of a shard
pub struct ShardPool {
    shard: ShardId,
    buffer: Arc<BatchBuffer>,
    metrics: Arc<ShardMetrics>,
    handles: Vec<(WorkerId, JoinHandle<WorkerReport>)>,
}

impl ShardPool {
    /// Spawn `workers` tasks competing on `stream`, all sharing one buffer.
    ///
    /// Each worker is enlisted with `coordinator` before it starts.
    #[instrument(
        name = "shard_pool_spawn",
        skip(stream, store, coordinator),
        fields(shard = %shard)
    )]
    pub fn spawn<S>(
        shard: ShardId,
        workers: u32,
        flush_threshold: usize,
        stream: DeliveryStream,
        store: Arc<S>,
        coordinator: &ShutdownCoordinator,
    ) -> Self
    where
        S: ArtifactStore + Send + Sync + 'static,
    {
        let buffer = Arc::new(BatchBuffer::new(shard));
        let metrics = Arc::new(ShardMetrics::new());

        let handles = (0..workers)
            .map(|ordinal| {
                let id = WorkerId::new(shard, ordinal);
                let worker = Worker::new(
                    id,
                    Arc::clone(&buffer),
                    stream.clone(),
                    Arc::clone(&store),
                    flush_threshold,
                    Arc::clone(&metrics),
                );
                let guard = coordinator.enlist();
                let handle = tokio::spawn(worker.run(coordinator.token(), guard));
                (id, handle)
            })
            .collect();

        info!(shard = %shard, workers, flush_threshold, "Shard pool started");

        Self {
            shard,
            buffer,
            metrics,
            handles,
        }
    }

    pub fn shard(&self) -> ShardId {
        self.shard
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Shared buffer of this shard
    pub fn buffer(&self) -> &Arc<BatchBuffer> {
        &self.buffer
    }

    pub fn metrics(&self) -> &Arc<ShardMetrics> {
        &self.metrics
    }

    /// Wait for every worker and collect their reports.
    ///
    /// A panicked worker is logged and left out of the result.
    #[instrument(name = "shard_pool_join", skip(self), fields(shard = %self.shard))]
    pub async fn join(self) -> Vec<WorkerReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for (id, handle) in self.handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => error!(worker = %id, error = ?e, "Worker task panicked"),
            }
        }
        reports
    }
}
