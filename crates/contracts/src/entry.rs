//! Entry - ingestion-side record
//!
//! Lives only long enough to be serialized and routed to a shard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ingested record: a timestamp plus an opaque value.
///
/// Serialized as JSON with an RFC 3339 `timestamp`, e.g.
/// `{"timestamp":"2024-05-01T10:00:00Z","value":"42"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub value: String,
}

impl Entry {
    pub fn new(timestamp: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Whole seconds since the unix epoch (floored)
    #[inline]
    pub fn unix_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
