//! Pipeline statistics and metrics.

use std::time::Duration;

use consumer::GroupStats;
use ingestion::MetricsSnapshot;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Entries published by the feed
    pub entries_ingested: u64,

    /// Feed lines or entries that could not be ingested
    pub entries_rejected: u64,

    /// Ingestor counters
    pub ingestion: MetricsSnapshot,

    /// Messages left in the queues when the group stopped
    pub queue_backlog: u64,

    /// Consumer group outcome
    pub group: GroupStats,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Payloads consumed per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.group.totals.received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of received payloads that reached an artifact, in percent
    pub fn durable_rate(&self) -> f64 {
        let received = self.group.totals.received;
        if received > 0 {
            self.group.totals.flushed_payloads as f64 / received as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let totals = &self.group.totals;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Shards: {}", self.group.shards);
        println!("   ├─ Workers: {}", self.group.workers);
        println!("   ├─ Entries ingested: {}", self.entries_ingested);
        println!("   ├─ Entries rejected: {}", self.entries_rejected);
        println!("   ├─ Left in queues: {}", self.queue_backlog);
        println!("   └─ Throughput: {:.2} payloads/s", self.throughput());

        println!("\n📦 Consumption");
        println!("   ├─ Received: {}", totals.received);
        println!("   ├─ Acked: {}", totals.acked);
        println!("   ├─ Ack failures: {}", totals.ack_failures);
        println!("   ├─ Flushes: {}", totals.flushes);
        println!(
            "   ├─ Flushed payloads: {} ({:.2}%)",
            totals.flushed_payloads,
            self.durable_rate()
        );
        println!("   ├─ Failed writes: {}", totals.write_failures);
        println!("   └─ Batch size: {}", self.group.flush_sizes.overall());

        println!("\n🛑 Worker exits");
        println!("   ├─ Cancelled: {}", self.group.cancelled);
        println!("   ├─ Stream closed: {}", self.group.stream_closed);
        println!("   └─ Ack failed: {}", self.group.ack_failed);

        if totals.lost_payloads > 0 {
            println!("\n⚠️  {} payloads lost to failed writes", totals.lost_payloads);
        }

        println!();
    }
}
