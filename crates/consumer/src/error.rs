//! Consumer error types

use broker::BrokerError;
use contracts::ShardId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Queue declaration or subscription failed for a shard
    #[error("failed to subscribe shard {shard}: {source}")]
    Subscribe {
        shard: ShardId,
        #[source]
        source: BrokerError,
    },
}

pub type Result<T> = std::result::Result<T, ConsumerError>;
