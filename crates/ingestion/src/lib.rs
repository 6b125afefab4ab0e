//! # Ingestion
//!
//! Entry ingestion module.
//!
//! Responsibilities:
//! - Route entries to shards by timestamp (`ShardRouter`)
//! - Serialize entries as JSON and publish them to the shard's queue
//! - Generate mock entries when no real producer is attached
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{Ingestor, ShardRouter};
//!
//! let ingestor = Ingestor::new(broker.clone(), ShardRouter::new(5)?);
//! ingestor.declare_queues().await?;
//! let shard = ingestor.ingest(&entry).await?;
//! ```

mod error;
mod ingestor;
mod metrics;
mod mock;
mod router;

// Re-exports
pub use contracts::Entry;
pub use error::{IngestionError, Result};
pub use ingestor::Ingestor;
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use mock::{MockEntryConfig, MockEntrySource};
pub use router::{shard_for, try_shard_for, ShardRouter};
