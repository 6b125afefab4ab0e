//! Broker error types

use contracts::{ContractError, ShardId};
use thiserror::Error;

/// Broker Client specific error
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Queue was used before `declare_queue`
    #[error("queue '{queue}' for shard {shard} is not declared")]
    QueueNotDeclared { shard: ShardId, queue: String },

    /// Queue was closed by the broker
    #[error("queue '{queue}' for shard {shard} is closed")]
    QueueClosed { shard: ShardId, queue: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl BrokerError {
    /// Create queue-not-declared error
    pub fn not_declared(shard: ShardId) -> Self {
        Self::QueueNotDeclared {
            shard,
            queue: crate::queue_name(shard),
        }
    }

    /// Create queue-closed error
    pub fn closed(shard: ShardId) -> Self {
        Self::QueueClosed {
            shard,
            queue: crate::queue_name(shard),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, BrokerError>;
