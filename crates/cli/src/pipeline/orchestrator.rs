//! Pipeline orchestrator - wires broker, ingestion and the consumer group.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use broker::{BrokerClient, MemoryBroker};
use consumer::{ConsumerGroup, FileArtifactStore, MonotonicClock};
use contracts::ConsumerSettings;
use ingestion::{Ingestor, ShardRouter};
use tokio::time::Instant;
use tracing::{info, warn};

use super::feed::FeedStats;
use super::{EntryFeed, PipelineStats};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated consumer settings
    pub settings: ConsumerSettings,

    /// Where ingested entries come from
    pub feed: EntryFeed,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the worktime deadline or until `shutdown` resolves.
    ///
    /// Either way every worker performs its final flush before this returns.
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let start_time = Instant::now();
        let PipelineConfig {
            settings,
            feed,
            metrics_port,
        } = self.config;

        if let Some(port) = metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let store = FileArtifactStore::new(
            "file",
            &settings.output_dir,
            Arc::new(MonotonicClock::new()),
        )
        .with_context(|| {
            format!(
                "Failed to create output dir {}",
                settings.output_dir.display()
            )
        })?;

        let broker = Arc::new(MemoryBroker::new());
        let ingestor = Ingestor::new(
            broker.clone(),
            ShardRouter::new(settings.shard_count).context("Invalid shard count")?,
        );
        ingestor
            .declare_queues()
            .await
            .context("Failed to declare shard queues")?;
        let ingestion_metrics = ingestor.metrics();

        let group = ConsumerGroup::new(settings.clone(), broker.clone(), Arc::new(store));
        let running = group.start().await.context("Failed to start consumer group")?;
        let coordinator = running.coordinator().clone();

        info!(
            shards = settings.shard_count,
            workers = settings.total_workers(),
            output_dir = %settings.output_dir.display(),
            "Pipeline started"
        );

        // Signal -> cancel; the deadline timer lives inside the group.
        let signal_task = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                shutdown.await;
                warn!("Received shutdown signal, stopping workers...");
                coordinator.cancel();
            })
        };

        let feed_task = tokio::spawn(feed.run(ingestor, coordinator.clone()));

        let group_stats = running.wait().await;
        signal_task.abort();

        let feed_stats = match feed_task.await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                warn!(error = %e, "Entry feed failed");
                FeedStats::default()
            }
            Err(e) => {
                warn!(error = ?e, "Entry feed task panicked");
                FeedStats::default()
            }
        };

        let queue_backlog = ingestion_backlog(&broker, &settings);
        broker.close().await;

        Ok(PipelineStats {
            entries_ingested: feed_stats.ingested,
            entries_rejected: feed_stats.rejected,
            ingestion: ingestion_metrics.snapshot(),
            queue_backlog,
            group: group_stats,
            duration: start_time.elapsed(),
        })
    }
}

/// Messages still queued (never delivered) across all shards
fn ingestion_backlog(broker: &MemoryBroker, settings: &ConsumerSettings) -> u64 {
    contracts::ShardId::all(settings.shard_count)
        .filter_map(|shard| broker.stats(shard))
        .map(|s| s.pending as u64)
        .sum()
}
