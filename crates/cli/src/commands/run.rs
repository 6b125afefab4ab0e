//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::ConsumerSettings;
use ingestion::MockEntryConfig;
use tracing::{error, info};

use super::load_settings;
use crate::cli::RunArgs;
use crate::pipeline::{EntryFeed, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref(), &args.overrides)
        .context("Failed to load settings")?;

    info!(
        shards = settings.shard_count,
        workers_per_shard = settings.workers_per_shard,
        flush_threshold = settings.flush_threshold,
        worktime_secs = settings.worktime_secs,
        output_dir = %settings.output_dir.display(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_settings_summary(&settings);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        settings,
        feed: entry_feed(args)?,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    info!("Starting pipeline...");

    let stats = Pipeline::new(pipeline_config)
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        received = stats.group.totals.received,
        flushes = stats.group.totals.flushes,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Shardline finished");
    Ok(())
}

fn entry_feed(args: &RunArgs) -> Result<EntryFeed> {
    let feed = if let Some(ref path) = args.input {
        EntryFeed::File(path.clone())
    } else if args.mock_entries > 0 {
        let config = MockEntryConfig {
            rate_hz: args.mock_rate,
            limit: Some(args.mock_entries),
            ..Default::default()
        };
        config.interval().context("Invalid mock entry rate")?;
        EntryFeed::Mock(config)
    } else {
        EntryFeed::None
    };
    Ok(feed)
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print settings summary for dry-run mode
fn print_settings_summary(settings: &ConsumerSettings) {
    println!("\n=== Settings Summary ===\n");
    println!("  Shards: {}", settings.shard_count);
    println!("  Workers per shard: {}", settings.workers_per_shard);
    println!("  Total workers: {}", settings.total_workers());
    println!("  Flush threshold: {}", settings.flush_threshold);
    println!("  Worktime: {}s", settings.worktime_secs);
    println!("  Output dir: {}", settings.output_dir.display());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["shardline", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_entry_feed_selection() {
        assert!(matches!(entry_feed(&run_args(&[])).unwrap(), EntryFeed::None));
        assert!(matches!(
            entry_feed(&run_args(&["--input", "e.jsonl"])).unwrap(),
            EntryFeed::File(_)
        ));
        match entry_feed(&run_args(&["--mock-entries", "7"])).unwrap() {
            EntryFeed::Mock(config) => assert_eq!(config.limit, Some(7)),
            other => panic!("expected mock feed, got {other:?}"),
        }
    }

    #[test]
    fn test_entry_feed_rejects_zero_rate() {
        let mut args = run_args(&["--mock-entries", "5"]);
        args.mock_rate = 0.0;
        assert!(entry_feed(&args).is_err());

        // Rate is irrelevant when nothing is generated
        let mut args = run_args(&[]);
        args.mock_rate = 0.0;
        assert!(matches!(entry_feed(&args).unwrap(), EntryFeed::None));
    }

    #[tokio::test]
    async fn test_dry_run_does_not_touch_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never-created");
        let out_arg = out.display().to_string();
        let args = run_args(&["--dry-run", "--output-dir", &out_arg]);

        run_pipeline(&args).await.unwrap();
        assert!(!out.exists());
    }
}
