//! Shard router
//!
//! Assigns an entry to a shard by its timestamp:
//! `index = floor(unix_seconds) mod shard_count`.

use std::num::NonZeroU32;

use contracts::{Entry, ShardId};

use crate::error::{IngestionError, Result};

/// Route `entry` to a shard.
///
/// Pure and deterministic: the same timestamp and shard count always give the
/// same index. Pre-epoch timestamps use the Euclidean remainder so the index
/// stays in `0..shard_count`.
#[inline]
pub fn shard_for(entry: &Entry, shard_count: NonZeroU32) -> ShardId {
    let index = entry
        .unix_seconds()
        .rem_euclid(i64::from(shard_count.get()));
    // rem_euclid of a positive u32 modulus always fits in u32
    ShardId::new(index as u32)
}

/// Checked variant of [`shard_for`] for an unvalidated count.
///
/// # Errors
/// Returns `IngestionError::InvalidShardCount` when `shard_count` is zero.
#[inline]
pub fn try_shard_for(entry: &Entry, shard_count: u32) -> Result<ShardId> {
    NonZeroU32::new(shard_count)
        .map(|count| shard_for(entry, count))
        .ok_or(IngestionError::InvalidShardCount)
}

/// Validated router for a fixed shard topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: NonZeroU32,
}

impl ShardRouter {
    /// # Errors
    /// Returns `IngestionError::InvalidShardCount` when `shard_count` is zero.
    pub fn new(shard_count: u32) -> Result<Self> {
        NonZeroU32::new(shard_count)
            .map(|shard_count| Self { shard_count })
            .ok_or(IngestionError::InvalidShardCount)
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count.get()
    }

    #[inline]
    pub fn route(&self, entry: &Entry) -> ShardId {
        shard_for(entry, self.shard_count)
    }
}
