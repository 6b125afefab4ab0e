//! # Contracts
//!
//! Frozen interface contracts shared by every shardline crate.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Delivery Model
//! - A shard owns one broker queue and one batch buffer per worker pool
//! - Payloads are opaque bytes; the core imposes no structure on them
//! - Acknowledgment happens on receipt, before the batch is durably written,
//!   so delivery is at-most-once once a payload has been acked

mod artifact;
mod delivery;
mod entry;
mod error;
mod settings;
mod shard;

pub use artifact::*;
pub use delivery::*;
pub use entry::Entry;
pub use error::*;
pub use settings::*;
pub use shard::{ShardId, WorkerId};
