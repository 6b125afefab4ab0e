//! Shutdown coordinator
//!
//! 一个取消信号广播给所有 worker，加一个完成计数器。
//! worker 持有 [`CompletionGuard`]，无论以何种方式退出 (包括 panic 展开)，
//! guard 被 drop 时都会计入完成数。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct CompletionTracker {
    expected: AtomicUsize,
    completed: AtomicUsize,
    notify: Notify,
}

impl CompletionTracker {
    fn is_drained(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.expected.load(Ordering::Acquire)
    }
}

/// 取消信号 + 完成计数
///
/// Clone 后共享同一状态。
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: Arc<CompletionTracker>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取消信号 (子 worker 使用 clone)
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 登记一个 worker，返回其完成 guard
    pub fn enlist(&self) -> CompletionGuard {
        self.tracker.expected.fetch_add(1, Ordering::AcqRel);
        CompletionGuard {
            tracker: self.tracker.clone(),
        }
    }

    /// 发出取消信号 (幂等)
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            info!(
                outstanding = self.expected().saturating_sub(self.completed()),
                "Shutdown requested"
            );
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `after` 之后自动取消；提前取消时定时任务直接退出
    pub fn cancel_after(&self, after: Duration) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = coordinator.token.cancelled() => {
                    debug!("Deadline timer dropped, already cancelled");
                }
                _ = tokio::time::sleep(after) => {
                    info!(after_secs = after.as_secs_f64(), "Worktime elapsed");
                    coordinator.cancel();
                }
            }
        })
    }

    /// 等待所有已登记 worker 完成
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.tracker.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.tracker.is_drained() {
                return;
            }
            notified.await;
        }
    }

    /// 已登记的 worker 数
    pub fn expected(&self) -> usize {
        self.tracker.expected.load(Ordering::Acquire)
    }

    /// 已完成的 worker 数
    pub fn completed(&self) -> usize {
        self.tracker.completed.load(Ordering::Acquire)
    }
}

/// 完成 guard，drop 时计数加一
#[derive(Debug)]
pub struct CompletionGuard {
    tracker: Arc<CompletionTracker>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.tracker.completed.fetch_add(1, Ordering::AcqRel);
        self.tracker.notify.notify_waiters();
    }
}
