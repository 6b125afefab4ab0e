//! # Broker
//!
//! Message broker client boundary.
//!
//! Responsibilities:
//! - Declare one durable queue per shard
//! - Publish payloads to a shard's queue (ingestion side)
//! - Hand out per-shard multi-consumer delivery streams with manual ack
//! - Provide an in-memory broker for tests and single-process runs

pub mod client;
pub mod error;
pub mod memory;

pub use client::BrokerClient;
pub use contracts::{Delivery, DeliveryStream, ShardId};
pub use error::{BrokerError, Result};
pub use memory::{MemoryBroker, QueueStats};

const BASE_QUEUE_NAME: &str = "task_queue";

/// Queue name for a shard, e.g. `task_queue_3`
pub fn queue_name(shard: ShardId) -> String {
    format!("{BASE_QUEUE_NAME}_{shard}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_name() {
        assert_eq!(queue_name(ShardId::new(3)), "task_queue_3");
    }
}
