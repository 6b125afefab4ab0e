//! Per-shard consumer metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by all workers of one shard pool
#[derive(Debug, Default)]
pub struct ShardMetrics {
    /// Deliveries pushed into the buffer
    received: AtomicU64,
    /// Deliveries acknowledged
    acked: AtomicU64,
    /// Acknowledgments rejected by the broker
    ack_failures: AtomicU64,
    /// Non-empty flushes that reached durable storage
    flushes: AtomicU64,
    /// Payloads contained in successful flushes
    flushed_payloads: AtomicU64,
    /// Flushes whose write failed (batch lost)
    write_failures: AtomicU64,
    /// Payloads contained in failed flushes
    lost_payloads: AtomicU64,
}

impl ShardMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_ack_failures(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful flush of `payloads` entries
    pub fn record_flush(&self, payloads: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.flushed_payloads
            .fetch_add(payloads as u64, Ordering::Relaxed);
    }

    /// Record a failed flush of `payloads` entries
    pub fn record_write_failure(&self, payloads: usize) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
        self.lost_payloads
            .fetch_add(payloads as u64, Ordering::Relaxed);
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> ShardMetricsSnapshot {
        ShardMetricsSnapshot {
            received: self.received(),
            acked: self.acked.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
            flushes: self.flushes(),
            flushed_payloads: self.flushed_payloads.load(Ordering::Relaxed),
            write_failures: self.write_failures(),
            lost_payloads: self.lost_payloads.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of shard metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShardMetricsSnapshot {
    pub received: u64,
    pub acked: u64,
    pub ack_failures: u64,
    pub flushes: u64,
    pub flushed_payloads: u64,
    pub write_failures: u64,
    pub lost_payloads: u64,
}

impl std::ops::AddAssign for ShardMetricsSnapshot {
    fn add_assign(&mut self, rhs: Self) {
        self.received += rhs.received;
        self.acked += rhs.acked;
        self.ack_failures += rhs.ack_failures;
        self.flushes += rhs.flushes;
        self.flushed_payloads += rhs.flushed_payloads;
        self.write_failures += rhs.write_failures;
        self.lost_payloads += rhs.lost_payloads;
    }
}
