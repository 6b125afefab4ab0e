//! Delivery - Broker Client output
//!
//! One unit of payload plus its acknowledgment capability.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::ContractError;

/// Opaque message body delivered by the broker
pub type Payload = Bytes;

/// Per-shard inbound stream.
///
/// Multi-consumer: every worker of a shard holds a clone and competes for
/// deliveries. `recv()` fails once the broker closes the queue.
pub type DeliveryStream = async_channel::Receiver<Delivery>;

/// Acknowledgment capability handed out with every delivery
///
/// Acking marks the message processed and removable from the queue. A message
/// that is never acked stays eligible for redelivery.
pub trait Acknowledger: Send + Sync {
    fn ack(&self, tag: u64) -> Result<(), ContractError>;
}

/// A message received from a shard queue
#[derive(Clone)]
pub struct Delivery {
    /// Broker-assigned delivery tag (unique per broker)
    pub tag: u64,

    /// Message body
    pub body: Payload,

    acknowledger: Arc<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(tag: u64, body: impl Into<Payload>, acknowledger: Arc<dyn Acknowledger>) -> Self {
        Self {
            tag,
            body: body.into(),
            acknowledger,
        }
    }

    /// Acknowledge this delivery
    ///
    /// # Errors
    /// Returns `ContractError::AckFailed` if the broker rejects the ack
    pub fn ack(&self) -> Result<(), ContractError> {
        self.acknowledger.ack(self.tag)
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("tag", &self.tag)
            .field("len", &self.body.len())
            .finish()
    }
}
