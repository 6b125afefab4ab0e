//! Pipeline orchestration module.

mod feed;
mod orchestrator;
mod stats;

pub use feed::EntryFeed;
pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::PipelineStats;
