//! ArtifactStore / SuffixSource - flush output interfaces
//!
//! Defines where a flushed batch goes and how artifact names stay unique.

use std::path::PathBuf;

use bytes::Bytes;

use crate::{ContractError, WorkerId};

/// Durable destination for flushed batches
///
/// Shared by every worker of every shard, so implementations take `&self`.
#[trait_variant::make(ArtifactStore: Send)]
pub trait LocalArtifactStore {
    /// Store name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Durably write one batch blob produced by `worker`
    ///
    /// Returns the location of the written artifact.
    ///
    /// # Errors
    /// Returns write error (should include context). The caller does not
    /// retry: the batch is lost.
    async fn persist(&self, worker: WorkerId, content: Bytes) -> Result<PathBuf, ContractError>;
}

/// Source of uniqueness tokens for artifact names
///
/// Injected so filename generation is deterministic under test.
pub trait SuffixSource: Send + Sync {
    fn next_suffix(&self) -> u64;
}
