//! ConsumerSettings - Config Loader 输出
//!
//! 描述分片拓扑、每个分片的并发度、刷新阈值、运行时长与输出目录。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// 消费端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConsumerSettings {
    /// 分片数 (队列分区数量)
    #[serde(default = "default_shard_count")]
    #[validate(range(min = 1, message = "shard_count must be >= 1"))]
    pub shard_count: u32,

    /// 每个分片的 worker 数 (并发度)
    #[serde(default = "default_workers_per_shard")]
    #[validate(range(min = 1, message = "workers_per_shard must be >= 1"))]
    pub workers_per_shard: u32,

    /// 触发提前刷新的缓冲区大小
    #[serde(default = "default_flush_threshold")]
    #[validate(range(min = 1, message = "flush_threshold must be >= 1"))]
    pub flush_threshold: usize,

    /// 分片组运行时长 (秒)，到期后取消所有 worker
    #[serde(default = "default_worktime_secs")]
    #[validate(range(min = 1, message = "worktime_secs must be >= 1"))]
    pub worktime_secs: u64,

    /// 输出目录
    #[serde(default = "default_output_dir")]
    #[validate(custom(function = "validate_output_dir"))]
    pub output_dir: PathBuf,
}

impl ConsumerSettings {
    /// 运行时长
    pub fn worktime(&self) -> Duration {
        Duration::from_secs(self.worktime_secs)
    }

    /// 所有分片的 worker 总数
    pub fn total_workers(&self) -> usize {
        self.shard_count as usize * self.workers_per_shard as usize
    }
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            shard_count: default_shard_count(),
            workers_per_shard: default_workers_per_shard(),
            flush_threshold: default_flush_threshold(),
            worktime_secs: default_worktime_secs(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_shard_count() -> u32 {
    5
}

fn default_workers_per_shard() -> u32 {
    3
}

fn default_flush_threshold() -> usize {
    5
}

fn default_worktime_secs() -> u64 {
    120
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data_dump")
}

fn validate_output_dir(path: &PathBuf) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        let mut err = ValidationError::new("empty_output_dir");
        err.message = Some("output_dir cannot be empty".into());
        return Err(err);
    }
    Ok(())
}
