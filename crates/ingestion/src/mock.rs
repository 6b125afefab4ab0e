//! Mock entry source
//!
//! 无 HTTP 入口时用于生成测试数据。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use contracts::Entry;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};

/// Mock entry 源配置
#[derive(Debug, Clone)]
pub struct MockEntryConfig {
    /// 发送频率 (Hz)
    pub rate_hz: f64,

    /// 最多发送的 entry 数 (None = 直到停止)
    pub limit: Option<u64>,

    /// value 前缀
    pub value_prefix: String,
}

impl Default for MockEntryConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            limit: None,
            value_prefix: "entry".to_string(),
        }
    }
}

impl MockEntryConfig {
    /// 两次发送之间的间隔
    ///
    /// # Errors
    /// `rate_hz` 非有限正数，或间隔超出 `Duration` 范围时返回 `IngestionError::InvalidRate`。
    pub fn interval(&self) -> Result<Duration> {
        if !self.rate_hz.is_finite() || self.rate_hz <= 0.0 {
            return Err(IngestionError::InvalidRate(self.rate_hz));
        }
        Duration::try_from_secs_f64(self.rate_hz.recip())
            .map_err(|_| IngestionError::InvalidRate(self.rate_hz))
    }
}

/// Mock entry 源
///
/// 以固定频率生成时间戳为当前时间的 entry。
pub struct MockEntrySource {
    config: MockEntryConfig,
    running: Arc<AtomicBool>,
}

impl MockEntrySource {
    /// 创建新的 Mock 源
    pub fn new(config: MockEntryConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 启动 Mock 源，返回 entry 接收端
    ///
    /// # Arguments
    /// * `channel_capacity` - 通道容量
    ///
    /// # Errors
    /// 频率无效时返回 `IngestionError::InvalidRate`，不会启动生成任务。
    pub fn start(&self, channel_capacity: usize) -> Result<mpsc::Receiver<Entry>> {
        let interval = self.config.interval()?;
        let (tx, rx) = mpsc::channel(channel_capacity);
        let config = self.config.clone();
        let running = self.running.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut sent: u64 = 0;

            debug!(rate_hz = config.rate_hz, limit = ?config.limit, "mock entry source started");

            while running.load(Ordering::Relaxed) {
                if config.limit.is_some_and(|limit| sent >= limit) {
                    break;
                }

                let entry = Entry::new(Utc::now(), format!("{}-{}", config.value_prefix, sent));
                if tx.send(entry).await.is_err() {
                    debug!("mock entry channel closed");
                    break;
                }
                sent += 1;
                trace!(sent, "mock entry sent");

                tokio::time::sleep(interval).await;
            }

            running.store(false, Ordering::SeqCst);
            debug!(sent, "mock entry source stopped");
        });

        Ok(rx)
    }

    /// 停止 Mock 源
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 检查是否正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
