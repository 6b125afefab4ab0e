//! In-memory broker
//!
//! 进程内的 broker 实现，用于测试与单机运行 (无需真实 RabbitMQ)，支持注入 ack 失败。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::{unbounded, Receiver, Sender};
use contracts::{Acknowledger, ContractError, Delivery, DeliveryStream, Payload, ShardId};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::client::BrokerClient;
use crate::error::{BrokerError, Result};

/// 单个队列的统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// 已发布消息数 (含重投)
    pub published: u64,
    /// 已确认消息数
    pub acked: u64,
    /// 已投递但尚未确认的消息数 (不含排队中的)
    pub outstanding: usize,
    /// 队列中等待投递的消息数
    pub pending: usize,
}

/// 未确认消息账本 (每个队列一份)
struct AckLedger {
    shard: ShardId,
    unacked: Mutex<BTreeMap<u64, Payload>>,
    acked: AtomicU64,
    fail_acks: Arc<AtomicBool>,
}

impl Acknowledger for AckLedger {
    fn ack(&self, tag: u64) -> std::result::Result<(), ContractError> {
        if self.fail_acks.load(Ordering::Relaxed) {
            return Err(ContractError::ack_failed(tag, "broker rejected ack"));
        }
        if self.unacked.lock().remove(&tag).is_none() {
            // 重复确认或未知 tag
            return Err(ContractError::ack_failed(
                tag,
                format!("unknown delivery tag on shard {}", self.shard),
            ));
        }
        self.acked.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// 单个分片队列
struct Queue {
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
    ledger: Arc<AckLedger>,
    published: AtomicU64,
}

/// 内存 broker
///
/// 每个分片一个无界 `async_channel`；delivery tag 在整个 broker 内单调递增。
pub struct MemoryBroker {
    queues: RwLock<HashMap<ShardId, Arc<Queue>>>,
    next_tag: AtomicU64,
    fail_acks: Arc<AtomicBool>,
}

impl MemoryBroker {
    /// 创建空 broker
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            next_tag: AtomicU64::new(1),
            fail_acks: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 注入 ack 失败：开启后所有 ack 都返回错误
    pub fn fail_acks(&self, fail: bool) {
        self.fail_acks.store(fail, Ordering::Relaxed);
    }

    /// 已声明的队列数
    pub fn queue_count(&self) -> usize {
        self.queues.read().len()
    }

    /// 获取队列统计
    pub fn stats(&self, shard: ShardId) -> Option<QueueStats> {
        self.queues.read().get(&shard).map(|queue| {
            let pending = queue.rx.len();
            QueueStats {
                published: queue.published.load(Ordering::Relaxed),
                acked: queue.ledger.acked.load(Ordering::Relaxed),
                outstanding: queue.ledger.unacked.lock().len().saturating_sub(pending),
                pending,
            }
        })
    }

    /// 重新投递所有未确认消息 (类似 AMQP basic.recover)
    ///
    /// 返回重投的 (已投递未确认) 消息数。排队中的消息按原顺序重新入队，
    /// 不会重复。所有重投消息都会获得新的 delivery tag。
    #[instrument(name = "memory_broker_recover", skip(self), fields(shard = %shard))]
    pub fn recover(&self, shard: ShardId) -> Result<usize> {
        let queue = self.queue(shard)?;
        let mut drained = 0usize;
        while queue.rx.try_recv().is_ok() {
            drained += 1;
        }
        let unacked = std::mem::take(&mut *queue.ledger.unacked.lock());
        let count = unacked.len().saturating_sub(drained);
        for (_, body) in unacked {
            self.enqueue(&queue, shard, body)?;
        }
        debug!(shard = %shard, count, requeued = drained, "redelivered unacked messages");
        Ok(count)
    }

    fn queue(&self, shard: ShardId) -> Result<Arc<Queue>> {
        self.queues
            .read()
            .get(&shard)
            .cloned()
            .ok_or_else(|| BrokerError::not_declared(shard))
    }

    fn enqueue(&self, queue: &Queue, shard: ShardId, body: Payload) -> Result<()> {
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        let acknowledger: Arc<dyn Acknowledger> = queue.ledger.clone();
        // 先记账再投递，保证消费者拿到消息时 tag 已可确认
        queue.ledger.unacked.lock().insert(tag, body.clone());
        if queue.tx.try_send(Delivery::new(tag, body, acknowledger)).is_err() {
            queue.ledger.unacked.lock().remove(&tag);
            return Err(BrokerError::closed(shard));
        }
        queue.published.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerClient for MemoryBroker {
    #[instrument(name = "memory_broker_declare_queue", skip(self), fields(shard = %shard))]
    async fn declare_queue(&self, shard: ShardId) -> Result<()> {
        let mut queues = self.queues.write();
        queues.entry(shard).or_insert_with(|| {
            let (tx, rx) = unbounded();
            debug!(queue = %crate::queue_name(shard), "declared queue");
            Arc::new(Queue {
                tx,
                rx,
                ledger: Arc::new(AckLedger {
                    shard,
                    unacked: Mutex::new(BTreeMap::new()),
                    acked: AtomicU64::new(0),
                    fail_acks: self.fail_acks.clone(),
                }),
                published: AtomicU64::new(0),
            })
        });
        Ok(())
    }

    async fn publish(&self, shard: ShardId, payload: Payload) -> Result<()> {
        let queue = self.queue(shard)?;
        self.enqueue(&queue, shard, payload)
    }

    #[instrument(name = "memory_broker_consume", skip(self), fields(shard = %shard))]
    async fn consume(&self, shard: ShardId) -> Result<DeliveryStream> {
        let queue = self.queue(shard)?;
        if queue.rx.is_closed() {
            return Err(BrokerError::closed(shard));
        }
        Ok(queue.rx.clone())
    }

    #[instrument(name = "memory_broker_close", skip(self))]
    async fn close(&self) {
        for (shard, queue) in self.queues.read().iter() {
            if queue.tx.close() {
                let outstanding = queue
                    .ledger
                    .unacked
                    .lock()
                    .len()
                    .saturating_sub(queue.rx.len());
                if outstanding > 0 {
                    warn!(shard = %shard, outstanding, "closing queue with unacked deliveries");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_publish_requires_declare() {
        let broker = MemoryBroker::new();
        let result = broker.publish(ShardId::new(0), Bytes::from("x")).await;
        assert!(matches!(result, Err(BrokerError::QueueNotDeclared { .. })));
    }

    #[tokio::test]
    async fn test_declare_idempotent() {
        let broker = MemoryBroker::new();
        broker.declare_queue(ShardId::new(1)).await.unwrap();
        broker.declare_queue(ShardId::new(1)).await.unwrap();
        assert_eq!(broker.queue_count(), 1);
    }

    #[tokio::test]
    async fn test_publish_consume_ack() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(0);
        broker.declare_queue(shard).await.unwrap();
        broker.publish(shard, Bytes::from("hello")).await.unwrap();

        let stream = broker.consume(shard).await.unwrap();
        let delivery = stream.recv().await.unwrap();
        assert_eq!(delivery.body, Bytes::from("hello"));

        let before = broker.stats(shard).unwrap();
        assert_eq!(before.outstanding, 1);

        delivery.ack().unwrap();
        let after = broker.stats(shard).unwrap();
        assert_eq!(after.acked, 1);
        assert_eq!(after.outstanding, 0);
    }

    #[tokio::test]
    async fn test_double_ack_fails() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(0);
        broker.declare_queue(shard).await.unwrap();
        broker.publish(shard, Bytes::from("once")).await.unwrap();

        let delivery = broker.consume(shard).await.unwrap().recv().await.unwrap();
        delivery.ack().unwrap();
        assert!(delivery.ack().is_err());
    }

    #[tokio::test]
    async fn test_fail_acks() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(0);
        broker.declare_queue(shard).await.unwrap();
        broker.publish(shard, Bytes::from("x")).await.unwrap();
        broker.fail_acks(true);

        let delivery = broker.consume(shard).await.unwrap().recv().await.unwrap();
        let err = delivery.ack().unwrap_err();
        assert!(matches!(err, ContractError::AckFailed { .. }));
    }

    #[tokio::test]
    async fn test_recover_redelivers_unacked() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(2);
        broker.declare_queue(shard).await.unwrap();
        broker.publish(shard, Bytes::from("a")).await.unwrap();
        broker.publish(shard, Bytes::from("b")).await.unwrap();

        let stream = broker.consume(shard).await.unwrap();
        let first = stream.recv().await.unwrap();
        let _second = stream.recv().await.unwrap();
        first.ack().unwrap();

        assert_eq!(broker.recover(shard).unwrap(), 1);
        let redelivered = stream.recv().await.unwrap();
        assert_eq!(redelivered.body, Bytes::from("b"));
        redelivered.ack().unwrap();

        let stats = broker.stats(shard).unwrap();
        assert_eq!(stats.published, 3);
        assert_eq!(stats.acked, 2);
        assert_eq!(stats.outstanding, 0);
    }

    #[tokio::test]
    async fn test_recover_keeps_pending_single() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(0);
        broker.declare_queue(shard).await.unwrap();
        for body in ["a", "b", "c"] {
            broker.publish(shard, Bytes::from(body)).await.unwrap();
        }

        let stream = broker.consume(shard).await.unwrap();
        let _unacked = stream.recv().await.unwrap();
        let before = broker.stats(shard).unwrap();
        assert_eq!((before.outstanding, before.pending), (1, 2));

        assert_eq!(broker.recover(shard).unwrap(), 1);
        let mut bodies = Vec::new();
        while let Ok(d) = stream.try_recv() {
            bodies.push(d.body);
        }
        assert_eq!(bodies, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
    }

    #[tokio::test]
    async fn test_close_drains_then_ends_stream() {
        let broker = MemoryBroker::new();
        let shard = ShardId::new(0);
        broker.declare_queue(shard).await.unwrap();
        broker.publish(shard, Bytes::from("last")).await.unwrap();
        let stream = broker.consume(shard).await.unwrap();

        broker.close().await;

        assert!(stream.recv().await.is_ok());
        assert!(stream.recv().await.is_err());
        assert!(matches!(
            broker.publish(shard, Bytes::from("late")).await,
            Err(BrokerError::QueueClosed { .. })
        ));
    }
}
