//! # Consumer
//!
//! Sharded batch consumption.
//!
//! Every shard gets a pool of workers competing on the shard's delivery
//! stream. Workers of a pool share one [`BatchBuffer`]; whoever pushes the
//! payload that brings it to the flush threshold writes the whole batch as a
//! single artifact. On cancellation (or stream close) each worker performs a
//! final drain, so remaining payloads are written exactly once.
//!
//! ## Usage Example
//!
//! ```ignore
//! use consumer::{ConsumerGroup, FileArtifactStore, MonotonicClock};
//!
//! let store = FileArtifactStore::new("file", &settings.output_dir, Arc::new(MonotonicClock::new()))?;
//! let group = ConsumerGroup::new(settings, broker, Arc::new(store));
//! let stats = group.run().await?;
//! ```

mod buffer;
mod error;
mod flush;
mod group;
mod metrics;
mod pool;
mod shutdown;
mod store;
mod suffix;
mod worker;

pub use buffer::BatchBuffer;
pub use error::{ConsumerError, Result};
pub use flush::{flush, join_batch, FlushOutcome};
pub use group::{ConsumerGroup, GroupStats, RunningGroup};
pub use metrics::{ShardMetrics, ShardMetricsSnapshot};
pub use pool::ShardPool;
pub use shutdown::{CompletionGuard, ShutdownCoordinator};
pub use store::FileArtifactStore;
pub use suffix::{FixedSuffix, MonotonicClock, SequenceSuffix};
pub use worker::{Worker, WorkerExit, WorkerReport};
