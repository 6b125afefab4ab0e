//! Ingestor - serialize, route, publish

use std::sync::Arc;

use broker::BrokerClient;
use bytes::Bytes;
use contracts::{Entry, ShardId};
use tracing::{debug, instrument, warn};

use crate::error::{IngestionError, Result};
use crate::metrics::IngestionMetrics;
use crate::router::ShardRouter;

/// Publishes entries onto the shard queue chosen by the router.
///
/// Queues must already be declared on the broker; see [`Ingestor::declare_queues`].
pub struct Ingestor<B> {
    broker: Arc<B>,
    router: ShardRouter,
    metrics: Arc<IngestionMetrics>,
}

impl<B: BrokerClient> Ingestor<B> {
    pub fn new(broker: Arc<B>, router: ShardRouter) -> Self {
        Self {
            broker,
            router,
            metrics: Arc::new(IngestionMetrics::new()),
        }
    }

    /// Declare the queue of every shard in the router's topology
    #[instrument(name = "ingestor_declare_queues", skip(self), fields(shards = self.router.shard_count()))]
    pub async fn declare_queues(&self) -> Result<()> {
        for shard in ShardId::all(self.router.shard_count()) {
            self.broker
                .declare_queue(shard)
                .await
                .map_err(|source| IngestionError::Publish { shard, source })?;
        }
        Ok(())
    }

    /// Serialize `entry` as JSON and publish it to its shard.
    ///
    /// Returns the shard the entry was published to.
    pub async fn ingest(&self, entry: &Entry) -> Result<ShardId> {
        let body = serde_json::to_vec(entry).inspect_err(|e| {
            self.metrics.record_serialize_error();
            warn!(error = %e, "failed to serialize entry");
        })?;

        let shard = self.router.route(entry);
        if let Err(source) = self.broker.publish(shard, Bytes::from(body)).await {
            self.metrics.record_publish_error(shard);
            warn!(shard = %shard, error = %source, "failed to publish entry");
            return Err(IngestionError::Publish { shard, source });
        }

        self.metrics.record_published(shard);
        debug!(shard = %shard, timestamp = %entry.timestamp, "entry published");
        Ok(shard)
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn router(&self) -> &ShardRouter {
        &self.router
    }
}
