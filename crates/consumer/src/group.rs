//! ConsumerGroup - every shard pool of a process plus the worktime deadline

use std::sync::Arc;
use std::time::Duration;

use broker::BrokerClient;
use contracts::{ArtifactStore, ConsumerSettings, ShardId};
use observability::FlushAggregator;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, instrument};

use crate::error::{ConsumerError, Result};
use crate::metrics::{ShardMetrics, ShardMetricsSnapshot};
use crate::pool::ShardPool;
use crate::shutdown::ShutdownCoordinator;
use crate::worker::{WorkerExit, WorkerReport};

/// Consumer side of the topology: `shard_count` pools of `workers_per_shard`
pub struct ConsumerGroup<B, S> {
    settings: ConsumerSettings,
    broker: Arc<B>,
    store: Arc<S>,
    coordinator: ShutdownCoordinator,
}

impl<B, S> ConsumerGroup<B, S>
where
    B: BrokerClient,
    S: ArtifactStore + Send + Sync + 'static,
{
    pub fn new(settings: ConsumerSettings, broker: Arc<B>, store: Arc<S>) -> Self {
        Self {
            settings,
            broker,
            store,
            coordinator: ShutdownCoordinator::new(),
        }
    }

    /// Coordinator shared with the pools; cancel it to stop the group early
    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    /// Declare and subscribe every shard queue, spawn the pools and arm the
    /// worktime deadline.
    #[instrument(
        name = "consumer_group_start",
        skip(self),
        fields(shards = self.settings.shard_count, workers = self.settings.workers_per_shard)
    )]
    pub async fn start(self) -> Result<RunningGroup> {
        let mut pools = Vec::with_capacity(self.settings.shard_count as usize);

        for shard in ShardId::all(self.settings.shard_count) {
            let stream = match self.subscribe(shard).await {
                Ok(stream) => stream,
                Err(e) => {
                    // Pools already running must not outlive a failed start
                    self.coordinator.cancel();
                    for pool in pools {
                        ShardPool::join(pool).await;
                    }
                    return Err(e);
                }
            };

            pools.push(ShardPool::spawn(
                shard,
                self.settings.workers_per_shard,
                self.settings.flush_threshold,
                stream,
                Arc::clone(&self.store),
                &self.coordinator,
            ));
        }

        let deadline = self.coordinator.cancel_after(self.settings.worktime());
        info!(
            total_workers = self.coordinator.expected(),
            worktime_secs = self.settings.worktime_secs,
            "Consumer group started"
        );

        Ok(RunningGroup {
            pools,
            coordinator: self.coordinator,
            deadline,
            started: Instant::now(),
        })
    }

    /// Start, then wait until the deadline (or an earlier cancel) drains all workers
    pub async fn run(self) -> Result<GroupStats> {
        Ok(self.start().await?.wait().await)
    }

    async fn subscribe(&self, shard: ShardId) -> Result<contracts::DeliveryStream> {
        self.broker
            .declare_queue(shard)
            .await
            .map_err(|source| ConsumerError::Subscribe { shard, source })?;
        self.broker
            .consume(shard)
            .await
            .map_err(|source| ConsumerError::Subscribe { shard, source })
    }
}

/// A started group
pub struct RunningGroup {
    pools: Vec<ShardPool>,
    coordinator: ShutdownCoordinator,
    deadline: JoinHandle<()>,
    started: Instant,
}

impl RunningGroup {
    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    /// Metrics of every pool, in shard order
    pub fn shard_metrics(&self) -> Vec<(ShardId, Arc<ShardMetrics>)> {
        self.pools
            .iter()
            .map(|p| (p.shard(), Arc::clone(p.metrics())))
            .collect()
    }

    /// Wait for the completion counter to reach the number of workers, then
    /// collect the per-worker reports.
    #[instrument(name = "consumer_group_wait", skip(self))]
    pub async fn wait(self) -> GroupStats {
        self.coordinator.wait_drained().await;
        self.deadline.abort();

        let mut stats = GroupStats {
            shards: self.pools.len(),
            ..Default::default()
        };
        for pool in self.pools {
            let snapshot = pool.metrics().snapshot();
            stats.totals += snapshot;
            stats.per_shard.push((pool.shard(), snapshot));
            stats.workers += pool.worker_count();
            for _ in 0..snapshot.write_failures {
                stats.flush_sizes.record_failure(pool.shard());
            }
            for report in pool.join().await {
                stats.record_report(&report);
                stats.reports.push(report);
            }
        }
        stats.duration = self.started.elapsed();

        info!(
            workers = stats.workers,
            received = stats.totals.received,
            flushes = stats.totals.flushes,
            duration_secs = stats.duration.as_secs_f64(),
            "Consumer group drained"
        );
        stats
    }
}

/// Outcome of a group run
#[derive(Debug, Clone, Default)]
pub struct GroupStats {
    pub shards: usize,
    pub workers: usize,
    pub totals: ShardMetricsSnapshot,
    pub per_shard: Vec<(ShardId, ShardMetricsSnapshot)>,
    pub reports: Vec<WorkerReport>,
    pub cancelled: usize,
    pub stream_closed: usize,
    pub ack_failed: usize,
    pub flush_sizes: FlushAggregator,
    pub duration: Duration,
}

impl GroupStats {
    fn record_report(&mut self, report: &WorkerReport) {
        for &size in &report.batch_sizes {
            self.flush_sizes.record_flush(report.id.shard, size);
        }
        match report.exit {
            WorkerExit::Cancelled => self.cancelled += 1,
            WorkerExit::StreamClosed => self.stream_closed += 1,
            WorkerExit::AckFailed { .. } => self.ack_failed += 1,
        }
    }

    /// Payloads consumed per second over the run
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.totals.received as f64 / secs
        } else {
            0.0
        }
    }
}
