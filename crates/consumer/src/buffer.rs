//! Per-shard batch buffer shared by every worker of a pool.
//!
//! A single reader-writer lock lives inside the buffer; callers never lock.
//! `snapshot_and_reset` swaps the storage for an empty vec inside one
//! critical section, so concurrent pushes land either in the captured batch
//! or in the fresh storage, never in both and never nowhere.

use std::fmt;

use contracts::{Payload, ShardId};
use parking_lot::RwLock;

/// Concurrency-safe accumulator of pending payloads for one shard
pub struct BatchBuffer {
    shard: ShardId,
    payloads: RwLock<Vec<Payload>>,
}

impl fmt::Debug for BatchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchBuffer")
            .field("shard", &self.shard)
            .field("len", &self.size())
            .finish()
    }
}

impl BatchBuffer {
    pub fn new(shard: ShardId) -> Self {
        Self {
            shard,
            payloads: RwLock::new(Vec::new()),
        }
    }

    #[inline]
    pub fn shard(&self) -> ShardId {
        self.shard
    }

    /// Append a payload at the tail.
    ///
    /// Returns the buffer size right after this push, observed inside the same
    /// critical section, so threshold checks do not race with other pushers.
    #[inline]
    pub fn push(&self, payload: Payload) -> usize {
        let mut payloads = self.payloads.write();
        payloads.push(payload);
        payloads.len()
    }

    /// Atomically take the current contents and leave the buffer empty.
    #[inline]
    pub fn snapshot_and_reset(&self) -> Vec<Payload> {
        std::mem::take(&mut *self.payloads.write())
    }

    /// Current number of buffered payloads
    #[inline]
    pub fn size(&self) -> usize {
        self.payloads.read().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payloads.read().is_empty()
    }
}
