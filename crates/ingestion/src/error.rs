//! Ingestion 错误类型

use broker::BrokerError;
use contracts::ShardId;
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 分片数必须大于 0
    #[error("shard count must be greater than zero")]
    InvalidShardCount,

    /// Mock 源频率必须为有限正数
    #[error("mock entry rate must be a finite positive number, got {0}")]
    InvalidRate(f64),

    /// Entry 序列化失败
    #[error("failed to serialize entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// 发布到分片队列失败
    #[error("failed to publish to shard {shard}: {source}")]
    Publish {
        /// 目标分片
        shard: ShardId,
        /// broker 错误
        #[source]
        source: BrokerError,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
