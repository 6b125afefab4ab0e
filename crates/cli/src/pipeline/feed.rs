//! Entry feeds - where ingested entries come from during a run

use std::path::{Path, PathBuf};

use broker::BrokerClient;
use consumer::ShutdownCoordinator;
use contracts::Entry;
use ingestion::{Ingestor, MockEntryConfig, MockEntrySource};
use tracing::{debug, info, warn};

use crate::error::{CliError, Result};

/// Source of entries for the ingestor
#[derive(Debug, Clone)]
pub enum EntryFeed {
    /// Nothing is ingested; the group consumes whatever the broker holds
    None,
    /// JSON lines, one `Entry` per line
    File(PathBuf),
    /// Generated entries
    Mock(MockEntryConfig),
}

/// Counters of one feed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub ingested: u64,
    pub rejected: u64,
}

impl EntryFeed {
    /// Push every entry of the feed through `ingestor`, stopping early on cancellation.
    ///
    /// Malformed lines and failed publishes are logged and counted, not fatal.
    pub async fn run<B: BrokerClient>(
        self,
        ingestor: Ingestor<B>,
        coordinator: ShutdownCoordinator,
    ) -> Result<FeedStats> {
        let stats = match self {
            Self::None => FeedStats::default(),
            Self::File(path) => feed_file(&path, &ingestor, &coordinator).await?,
            Self::Mock(config) => feed_mock(config, &ingestor, &coordinator).await?,
        };
        info!(
            ingested = stats.ingested,
            rejected = stats.rejected,
            "Entry feed finished"
        );
        Ok(stats)
    }
}

async fn ingest_one<B: BrokerClient>(
    ingestor: &Ingestor<B>,
    entry: &Entry,
    stats: &mut FeedStats,
) {
    match ingestor.ingest(entry).await {
        Ok(shard) => {
            stats.ingested += 1;
            debug!(shard = %shard, "Entry ingested");
        }
        Err(e) => {
            stats.rejected += 1;
            warn!(error = %e, "Entry not ingested");
        }
    }
}

async fn feed_file<B: BrokerClient>(
    path: &Path,
    ingestor: &Ingestor<B>,
    coordinator: &ShutdownCoordinator,
) -> Result<FeedStats> {
    let content = tokio::fs::read_to_string(path).await?;
    let mut stats = FeedStats::default();

    for (index, line) in content.lines().enumerate() {
        if coordinator.is_cancelled() {
            warn!(line = index + 1, "Shutdown during input feed, remaining lines skipped");
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Entry>(line) {
            Ok(entry) => ingest_one(ingestor, &entry, &mut stats).await,
            Err(source) => {
                stats.rejected += 1;
                let e = CliError::input_parse(path, index + 1, source);
                warn!(error = %e, "Skipping input line");
            }
        }
    }

    Ok(stats)
}

async fn feed_mock<B: BrokerClient>(
    config: MockEntryConfig,
    ingestor: &Ingestor<B>,
    coordinator: &ShutdownCoordinator,
) -> Result<FeedStats> {
    let source = MockEntrySource::new(config);
    let mut rx = source.start(64)?;
    let token = coordinator.token();
    let mut stats = FeedStats::default();

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = rx.recv() => match next {
                Some(entry) => ingest_one(ingestor, &entry, &mut stats).await,
                None => break,
            },
        }
    }

    source.stop();
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::MemoryBroker;
    use contracts::ShardId;
    use ingestion::{IngestionError, ShardRouter};
    use std::sync::Arc;

    async fn ingestor(broker: &Arc<MemoryBroker>, shards: u32) -> Ingestor<MemoryBroker> {
        let ingestor = Ingestor::new(broker.clone(), ShardRouter::new(shards).unwrap());
        ingestor.declare_queues().await.unwrap();
        ingestor
    }

    #[tokio::test]
    async fn test_file_feed_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"timestamp":"1970-01-01T00:00:01Z","value":"a"}"#,
                "\n\nnot json\n",
                r#"{"timestamp":"1970-01-01T00:00:02Z","value":"b"}"#,
                "\n"
            ),
        )
        .unwrap();

        let broker = Arc::new(MemoryBroker::new());
        let stats = EntryFeed::File(path)
            .run(ingestor(&broker, 2).await, ShutdownCoordinator::new())
            .await
            .unwrap();

        assert_eq!(stats, FeedStats { ingested: 2, rejected: 1 });
        assert_eq!(broker.stats(ShardId::new(0)).unwrap().published, 1);
        assert_eq!(broker.stats(ShardId::new(1)).unwrap().published, 1);
    }

    #[tokio::test]
    async fn test_file_feed_missing_file() {
        let broker = Arc::new(MemoryBroker::new());
        let result = EntryFeed::File(PathBuf::from("/nonexistent/entries.jsonl"))
            .run(ingestor(&broker, 1).await, ShutdownCoordinator::new())
            .await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[tokio::test]
    async fn test_mock_feed_respects_limit() {
        let broker = Arc::new(MemoryBroker::new());
        let config = MockEntryConfig {
            rate_hz: 1000.0,
            limit: Some(4),
            ..Default::default()
        };
        let stats = EntryFeed::Mock(config)
            .run(ingestor(&broker, 1).await, ShutdownCoordinator::new())
            .await
            .unwrap();

        assert_eq!(stats.ingested, 4);
        assert_eq!(broker.stats(ShardId::new(0)).unwrap().published, 4);
    }

    #[tokio::test]
    async fn test_mock_feed_zero_rate_is_an_error() {
        let broker = Arc::new(MemoryBroker::new());
        let config = MockEntryConfig {
            rate_hz: 0.0,
            limit: Some(5),
            ..Default::default()
        };
        let result = EntryFeed::Mock(config)
            .run(ingestor(&broker, 1).await, ShutdownCoordinator::new())
            .await;

        assert!(matches!(
            result,
            Err(CliError::Feed(IngestionError::InvalidRate(_)))
        ));
        assert_eq!(broker.stats(ShardId::new(0)).unwrap().published, 0);
    }

    #[tokio::test]
    async fn test_cancelled_feed_ingests_nothing() {
        let broker = Arc::new(MemoryBroker::new());
        let coordinator = ShutdownCoordinator::new();
        coordinator.cancel();

        let stats = EntryFeed::Mock(MockEntryConfig::default())
            .run(ingestor(&broker, 1).await, coordinator)
            .await
            .unwrap();
        assert_eq!(stats.ingested, 0);
    }
}
