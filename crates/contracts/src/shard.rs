//! Shard and worker identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a queue partition, `0..shard_count`.
///
/// Shard count is fixed for the process lifetime, so a `ShardId` stays valid
/// once it has been handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardId(u32);

impl ShardId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// All shard ids for a topology of `count` shards
    pub fn all(count: u32) -> impl Iterator<Item = ShardId> {
        (0..count).map(ShardId)
    }
}

impl From<u32> for ShardId {
    #[inline]
    fn from(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one worker: the shard it drains plus its ordinal in the pool.
///
/// Rendered as `"{shard}-{ordinal}"`, which is also the prefix of every
/// artifact the worker writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId {
    pub shard: ShardId,
    pub ordinal: u32,
}

impl WorkerId {
    #[inline]
    pub const fn new(shard: ShardId, ordinal: u32) -> Self {
        Self { shard, ordinal }
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.shard, self.ordinal)
    }
}
