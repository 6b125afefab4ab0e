//! Ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::ShardId;
use metrics::counter;

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Entries routed and published
    pub entries_published: AtomicU64,

    /// Entries that failed to serialize
    pub serialize_errors: AtomicU64,

    /// Entries the broker refused
    pub publish_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record entry published to `shard`
    pub fn record_published(&self, shard: ShardId) {
        self.entries_published.fetch_add(1, Ordering::Relaxed);
        counter!("shardline_entries_published_total", "shard" => shard.to_string()).increment(1);
    }

    /// Record serialize error
    pub fn record_serialize_error(&self) {
        self.serialize_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record publish error
    pub fn record_publish_error(&self, shard: ShardId) {
        self.publish_errors.fetch_add(1, Ordering::Relaxed);
        counter!("shardline_publish_failures_total", "shard" => shard.to_string()).increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries_published: self.entries_published.load(Ordering::Relaxed),
            serialize_errors: self.serialize_errors.load(Ordering::Relaxed),
            publish_errors: self.publish_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Entries routed and published
    pub entries_published: u64,

    /// Entries that failed to serialize
    pub serialize_errors: u64,

    /// Entries the broker refused
    pub publish_errors: u64,
}
