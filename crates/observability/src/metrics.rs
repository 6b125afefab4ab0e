//! 分片消费指标
//!
//! 通过 `metrics` facade 上报，由 Prometheus exporter 导出。
//! 所有指标都带 `shard` 标签。

use std::collections::BTreeMap;
use std::fmt;

use contracts::ShardId;
use metrics::{counter, gauge, histogram};

/// 记录一条 payload 被 worker 接收
pub fn record_payload_received(shard: ShardId) {
    counter!("shardline_payloads_received_total", "shard" => shard.to_string()).increment(1);
}

/// 记录一次成功的 flush
///
/// 批大小同时进入 histogram，用于观察阈值触发与收尾 flush 的分布。
pub fn record_flush(shard: ShardId, payloads: usize) {
    counter!("shardline_flushes_total", "shard" => shard.to_string()).increment(1);
    histogram!("shardline_flush_batch_size", "shard" => shard.to_string())
        .record(payloads as f64);
}

/// 记录一次失败的 flush (该批数据已丢失)
pub fn record_flush_failure(shard: ShardId, payloads: usize) {
    counter!("shardline_flush_failures_total", "shard" => shard.to_string()).increment(1);
    counter!("shardline_payloads_lost_total", "shard" => shard.to_string())
        .increment(payloads as u64);
}

/// 记录 ack 失败
pub fn record_ack_failure(shard: ShardId) {
    counter!("shardline_ack_failures_total", "shard" => shard.to_string()).increment(1);
}

/// 记录缓冲区深度
pub fn record_buffer_depth(shard: ShardId, depth: usize) {
    gauge!("shardline_buffer_depth", "shard" => shard.to_string()).set(depth as f64);
}

/// 批大小统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSizeStats {
    count: u64,
    total: u64,
    min: usize,
    max: usize,
}

impl BatchSizeStats {
    /// 添加一个批大小
    pub fn push(&mut self, size: usize) {
        if self.count == 0 {
            self.min = size;
            self.max = size;
        } else {
            self.min = self.min.min(size);
            self.max = self.max.max(size);
        }
        self.count += 1;
        self.total += size as u64;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// 均值 (无样本时为 0)
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

impl fmt::Display for BatchSizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={}, max={}, mean={:.2} (n={})",
                self.min,
                self.max,
                self.mean(),
                self.count
            )
        }
    }
}

/// Flush 指标聚合器
///
/// 在内存中按分片聚合，运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct FlushAggregator {
    per_shard: BTreeMap<ShardId, BatchSizeStats>,
    failures: BTreeMap<ShardId, u64>,
}

impl FlushAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次成功 flush
    pub fn record_flush(&mut self, shard: ShardId, payloads: usize) {
        self.per_shard.entry(shard).or_default().push(payloads);
    }

    /// 记录一次失败 flush
    pub fn record_failure(&mut self, shard: ShardId) {
        *self.failures.entry(shard).or_insert(0) += 1;
    }

    /// 所有分片合并后的批大小统计
    pub fn overall(&self) -> BatchSizeStats {
        let mut merged = BatchSizeStats::default();
        for stats in self.per_shard.values().filter(|s| s.count > 0) {
            if merged.count == 0 {
                merged = *stats;
            } else {
                merged.count += stats.count;
                merged.total += stats.total;
                merged.min = merged.min.min(stats.min);
                merged.max = merged.max.max(stats.max);
            }
        }
        merged
    }

    pub fn shard(&self, shard: ShardId) -> Option<&BatchSizeStats> {
        self.per_shard.get(&shard)
    }

    pub fn failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for FlushAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Flush Summary ===")?;
        writeln!(f, "Batch size: {}", self.overall())?;
        writeln!(f, "Failed flushes: {}", self.failures())?;
        for (shard, stats) in &self.per_shard {
            writeln!(f, "  shard {}: {}", shard, stats)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_stats() {
        let mut stats = BatchSizeStats::default();
        assert_eq!(stats.to_string(), "N/A");

        for size in [5, 5, 2, 8] {
            stats.push(size);
        }
        assert_eq!(stats.count(), 4);
        assert_eq!(stats.total(), 20);
        assert_eq!(stats.min(), 2);
        assert_eq!(stats.max(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_merges_shards() {
        let mut agg = FlushAggregator::new();
        agg.record_flush(ShardId::new(0), 5);
        agg.record_flush(ShardId::new(0), 3);
        agg.record_flush(ShardId::new(2), 1);
        agg.record_failure(ShardId::new(2));

        let overall = agg.overall();
        assert_eq!(overall.count(), 3);
        assert_eq!(overall.min(), 1);
        assert_eq!(overall.max(), 5);
        assert_eq!(agg.failures(), 1);
        assert_eq!(agg.shard(ShardId::new(0)).map(|s| s.total()), Some(8));
        assert!(agg.shard(ShardId::new(1)).is_none());

        agg.reset();
        assert_eq!(agg.overall().count(), 0);
    }

    #[test]
    fn test_recorders_without_exporter_are_noops() {
        // No recorder installed: the facade swallows everything.
        record_payload_received(ShardId::new(0));
        record_flush(ShardId::new(0), 5);
        record_flush_failure(ShardId::new(0), 2);
        record_ack_failure(ShardId::new(0));
        record_buffer_depth(ShardId::new(0), 3);
    }
}
