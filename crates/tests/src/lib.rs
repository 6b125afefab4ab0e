//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - Ingestor -> MemoryBroker -> ConsumerGroup -> 文件 的 e2e 测试
//! - 关闭、ack 失败、写失败等边界场景

#[cfg(test)]
mod contract_tests {
    use chrono::{TimeZone, Utc};
    use contracts::{ConsumerSettings, Entry, ShardId, WorkerId};

    #[test]
    fn test_entry_wire_format() {
        let entry = Entry::new(Utc.timestamp_opt(7, 0).unwrap(), "seven");
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"timestamp":"1970-01-01T00:00:07Z","value":"seven"}"#);
    }

    #[test]
    fn test_worker_id_display() {
        assert_eq!(WorkerId::new(ShardId::new(3), 1).to_string(), "3-1");
    }

    #[test]
    fn test_default_settings() {
        let settings = ConsumerSettings::default();
        assert_eq!(settings.shard_count, 5);
        assert_eq!(settings.workers_per_shard, 3);
        assert_eq!(settings.flush_threshold, 5);
        assert_eq!(settings.worktime_secs, 120);
        assert_eq!(settings.output_dir, std::path::PathBuf::from("./data_dump"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use broker::{BrokerClient, MemoryBroker};
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};
    use consumer::{ConsumerGroup, FileArtifactStore, MonotonicClock, RunningGroup, SequenceSuffix};
    use contracts::{ConsumerSettings, Entry, ShardId};
    use ingestion::{Ingestor, ShardRouter};
    use tokio::time::timeout;

    fn settings(
        shards: u32,
        workers: u32,
        threshold: usize,
        worktime_secs: u64,
        dir: &Path,
    ) -> ConsumerSettings {
        ConsumerSettings {
            shard_count: shards,
            workers_per_shard: workers,
            flush_threshold: threshold,
            worktime_secs,
            output_dir: dir.to_path_buf(),
        }
    }

    fn file_store(dir: &Path) -> Arc<FileArtifactStore> {
        Arc::new(FileArtifactStore::new("e2e", dir, Arc::new(MonotonicClock::new())).unwrap())
    }

    async fn wait_received(running: &RunningGroup, n: u64) {
        let metrics = running.shard_metrics();
        timeout(Duration::from_secs(5), async {
            while metrics.iter().map(|(_, m)| m.received()).sum::<u64>() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("all deliveries consumed");
    }

    /// (file name, content) of every artifact, sorted by name
    fn artifacts(dir: &Path) -> Vec<(String, String)> {
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, std::fs::read_to_string(&path).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    /// Threshold reached by the fifth push: exactly one artifact "a\nb\nc\nd\ne"
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_threshold_flush_single_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(MemoryBroker::new());
        let group = ConsumerGroup::new(
            settings(1, 1, 5, 3600, dir.path()),
            broker.clone(),
            file_store(dir.path()),
        );
        let running = group.start().await.unwrap();

        for body in ["a", "b", "c", "d", "e"] {
            broker.publish(ShardId::new(0), Bytes::from(body)).await.unwrap();
        }
        wait_received(&running, 5).await;

        running.coordinator().cancel();
        let stats = running.wait().await;

        let files = artifacts(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].0.starts_with("0-0_") && files[0].0.ends_with(".txt"));
        assert_eq!(files[0].1, "a\nb\nc\nd\ne");
        assert_eq!(stats.totals.flushes, 1);
    }

    /// Below threshold then cancel: the final flush writes the remainder
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_flushes_remainder() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(MemoryBroker::new());
        let group = ConsumerGroup::new(
            settings(1, 1, 5, 3600, dir.path()),
            broker.clone(),
            file_store(dir.path()),
        );
        let running = group.start().await.unwrap();

        broker.publish(ShardId::new(0), Bytes::from("a")).await.unwrap();
        broker.publish(ShardId::new(0), Bytes::from("b")).await.unwrap();
        wait_received(&running, 2).await;
        assert!(artifacts(dir.path()).is_empty());

        running.coordinator().cancel();
        running.wait().await;

        let files = artifacts(dir.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].1, "a\nb");
    }

    /// Nothing received: no artifact at all
    #[tokio::test]
    async fn test_idle_group_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(MemoryBroker::new());
        let group = ConsumerGroup::new(
            settings(2, 3, 5, 3600, dir.path()),
            broker,
            file_store(dir.path()),
        );
        let running = group.start().await.unwrap();

        running.coordinator().cancel();
        let stats = timeout(Duration::from_secs(2), running.wait()).await.unwrap();

        assert_eq!(stats.cancelled, 6);
        assert!(artifacts(dir.path()).is_empty());
    }

    /// Entries go through the router; every artifact holds entries of its own
    /// shard and every entry is written exactly once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ingest_to_artifacts_exactly_once() {
        const SHARDS: u32 = 3;
        const ENTRIES: i64 = 60;

        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(MemoryBroker::new());
        let ingestor = Ingestor::new(broker.clone(), ShardRouter::new(SHARDS).unwrap());
        ingestor.declare_queues().await.unwrap();

        let group = ConsumerGroup::new(
            settings(SHARDS, 2, 4, 3600, dir.path()),
            broker.clone(),
            file_store(dir.path()),
        );
        let running = group.start().await.unwrap();

        for secs in 0..ENTRIES {
            let entry = Entry::new(Utc.timestamp_opt(secs, 0).unwrap(), format!("v{secs}"));
            ingestor.ingest(&entry).await.unwrap();
        }
        wait_received(&running, ENTRIES as u64).await;

        running.coordinator().cancel();
        let stats = running.wait().await;
        assert_eq!(stats.totals.received, ENTRIES as u64);
        assert_eq!(stats.totals.flushed_payloads, ENTRIES as u64);

        let mut seen: HashMap<String, usize> = HashMap::new();
        for (name, content) in artifacts(dir.path()) {
            let shard: i64 = name.split('-').next().unwrap().parse().unwrap();
            for line in content.split('\n') {
                let entry: Entry = serde_json::from_str(line).unwrap();
                assert_eq!(entry.unix_seconds().rem_euclid(SHARDS as i64), shard);
                *seen.entry(entry.value).or_default() += 1;
            }
        }
        assert_eq!(seen.len(), ENTRIES as usize);
        assert!(seen.values().all(|&n| n == 1));

        for shard in ShardId::all(SHARDS) {
            let queue = broker.stats(shard).unwrap();
            assert_eq!(queue.published, 20);
            assert_eq!(queue.outstanding, 0);
        }
    }

    /// Worktime deadline alone stops the group
    #[tokio::test]
    async fn test_worktime_deadline_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "shard_count = 2\nworkers_per_shard = 2\nworktime_secs = 1\noutput_dir = {:?}\n",
            dir.path().display().to_string()
        );
        let settings =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        let broker = Arc::new(MemoryBroker::new());
        let group = ConsumerGroup::new(settings, broker.clone(), file_store(dir.path()));
        let running = group.start().await.unwrap();
        broker.publish(ShardId::new(1), Bytes::from("late")).await.unwrap();

        let stats = timeout(Duration::from_secs(5), running.wait())
            .await
            .expect("deadline reached");

        assert_eq!(stats.cancelled, 4);
        assert!(stats.duration >= Duration::from_secs(1));
        let files = artifacts(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].0.starts_with("1-"));
        assert_eq!(files[0].1, "late");
    }

    /// Ack failures end the workers but the group still drains
    #[tokio::test]
    async fn test_ack_failure_then_recover() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(MemoryBroker::new());
        broker.fail_acks(true);

        let group = ConsumerGroup::new(
            settings(1, 1, 5, 3600, dir.path()),
            broker.clone(),
            file_store(dir.path()),
        );
        let running = group.start().await.unwrap();
        broker.publish(ShardId::new(0), Bytes::from("x")).await.unwrap();

        let stats = timeout(Duration::from_secs(2), running.wait()).await.unwrap();
        assert_eq!(stats.ack_failed, 1);
        assert_eq!(broker.stats(ShardId::new(0)).unwrap().outstanding, 1);

        // the unacked message is redelivered to a fresh group
        broker.fail_acks(false);
        assert_eq!(broker.recover(ShardId::new(0)).unwrap(), 1);

        let out2 = dir.path().join("second");
        let group = ConsumerGroup::new(
            settings(1, 1, 5, 3600, &out2),
            broker.clone(),
            Arc::new(
                FileArtifactStore::new("second", &out2, Arc::new(SequenceSuffix::starting_at(1)))
                    .unwrap(),
            ),
        );
        let running = group.start().await.unwrap();
        wait_received(&running, 1).await;
        running.coordinator().cancel();
        running.wait().await;

        assert_eq!(artifacts(&out2), vec![("0-0_1.txt".to_string(), "x".to_string())]);
        assert_eq!(broker.stats(ShardId::new(0)).unwrap().outstanding, 0);
    }

    /// Write failures lose the batch, are counted, and do not stop the workers
    #[tokio::test]
    async fn test_write_failure_counted() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let store = file_store(&out);
        std::fs::remove_dir_all(&out).unwrap();

        let broker = Arc::new(MemoryBroker::new());
        let group = ConsumerGroup::new(settings(1, 2, 2, 3600, &out), broker.clone(), store);
        let running = group.start().await.unwrap();
        for body in ["a", "b", "c"] {
            broker.publish(ShardId::new(0), Bytes::from(body)).await.unwrap();
        }
        wait_received(&running, 3).await;

        running.coordinator().cancel();
        let stats = running.wait().await;

        assert_eq!(stats.cancelled, 2);
        assert_eq!(stats.totals.flushes, 0);
        assert!(stats.totals.write_failures >= 1);
        assert_eq!(stats.totals.lost_payloads, 3);
        assert!(!out.exists());
    }
}
