//! Flush - drain a buffer into one durable artifact

use std::path::PathBuf;

use bytes::{BufMut, Bytes, BytesMut};
use contracts::{ArtifactStore, Payload, WorkerId};
use tracing::{error, info};

use crate::buffer::BatchBuffer;
use crate::metrics::ShardMetrics;

/// Result of one flush attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Buffer was empty, nothing written
    Empty,
    /// Batch written to `path`
    Written { path: PathBuf, payloads: usize },
    /// Write failed; the captured batch is lost
    Failed { payloads: usize },
}

impl FlushOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Join payloads with a single `\n`, no trailing separator
pub fn join_batch(batch: &[Payload]) -> Bytes {
    let len = batch.iter().map(|p| p.len()).sum::<usize>() + batch.len().saturating_sub(1);
    let mut out = BytesMut::with_capacity(len);
    for (i, payload) in batch.iter().enumerate() {
        if i > 0 {
            out.put_u8(b'\n');
        }
        out.extend_from_slice(payload);
    }
    out.freeze()
}

/// Snapshot-and-reset `buffer` and persist the batch through `store`.
///
/// An empty snapshot writes nothing. A failed write is logged and counted,
/// never retried and never returned to the buffer.
pub async fn flush<S>(
    buffer: &BatchBuffer,
    worker: WorkerId,
    store: &S,
    metrics: &ShardMetrics,
) -> FlushOutcome
where
    S: ArtifactStore + Sync,
{
    let batch = buffer.snapshot_and_reset();
    if batch.is_empty() {
        return FlushOutcome::Empty;
    }

    let payloads = batch.len();
    let shard = worker.shard;
    match store.persist(worker, join_batch(&batch)).await {
        Ok(path) => {
            metrics.record_flush(payloads);
            observability::record_flush(shard, payloads);
            info!(
                worker = %worker,
                store = store.name(),
                payloads,
                path = %path.display(),
                "Batch flushed"
            );
            FlushOutcome::Written { path, payloads }
        }
        Err(e) => {
            metrics.record_write_failure(payloads);
            observability::record_flush_failure(shard, payloads);
            error!(worker = %worker, payloads, error = %e, "Flush failed, batch dropped");
            FlushOutcome::Failed { payloads }
        }
    }
}
