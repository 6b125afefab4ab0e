//! Broker client abstraction
//!
//! Defines the per-shard queue operations the ingestion and consumption sides
//! rely on, so a real AMQP connection and the in-memory broker are
//! interchangeable.

use std::future::Future;

use contracts::{DeliveryStream, Payload, ShardId};

use crate::error::Result;

/// Broker client trait
///
/// One durable queue per shard. Connection and channel bootstrapping happen
/// before a client value exists and are not part of this interface.
pub trait BrokerClient: Send + Sync {
    /// Declare the queue for `shard`
    ///
    /// Idempotent operation: declaring an existing queue returns Ok
    fn declare_queue(&self, shard: ShardId) -> impl Future<Output = Result<()>> + Send;

    /// Publish a message body onto the queue for `shard`
    fn publish(&self, shard: ShardId, payload: Payload)
        -> impl Future<Output = Result<()>> + Send;

    /// Get the delivery stream for `shard`
    ///
    /// The returned stream is multi-consumer; clones compete for deliveries.
    /// Acknowledgment is manual: every delivery must be acked by its consumer.
    fn consume(&self, shard: ShardId) -> impl Future<Output = Result<DeliveryStream>> + Send;

    /// Close every queue
    ///
    /// Open delivery streams yield what is already queued, then end.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
