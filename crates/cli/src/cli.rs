//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::ConsumerSettings;
use std::path::PathBuf;
use tracing::info;

/// Shardline - sharded queue consumer with batched durable flushes
#[derive(Parser, Debug)]
#[command(
    name = "shardline",
    author,
    version,
    about = "Sharded queue consumer with batched file artifacts",
    long_about = "Routes timestamped entries to per-shard queues and consumes every shard \n\
                  with a pool of workers that share one batch buffer. Batches are flushed \n\
                  to text files on threshold and once more on shutdown."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SHARDLINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SHARDLINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the consumer group (optionally feeding it entries)
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display effective settings
    Info(InfoArgs),
}

/// Per-field overrides applied on top of the config file (or defaults)
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Number of shards
    #[arg(long = "shards", env = "SHARDS_COUNT")]
    pub shard_count: Option<u32>,

    /// Workers per shard
    #[arg(long = "workers", env = "WORKERS_COUNT")]
    pub workers_per_shard: Option<u32>,

    /// Buffer size that triggers an early flush
    #[arg(long, env = "FLUSH_THRESHOLD")]
    pub flush_threshold: Option<usize>,

    /// Seconds before every worker is cancelled
    #[arg(long = "worktime", env = "WORKERS_WORKTIME_SECONDS")]
    pub worktime_secs: Option<u64>,

    /// Directory receiving flushed artifacts
    #[arg(long, env = "DATA_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
}

impl SettingsOverrides {
    /// Apply every override that is set
    pub fn apply(&self, settings: &mut ConsumerSettings) {
        if let Some(v) = self.shard_count {
            info!(shard_count = v, "Overriding shard count");
            settings.shard_count = v;
        }
        if let Some(v) = self.workers_per_shard {
            info!(workers_per_shard = v, "Overriding workers per shard");
            settings.workers_per_shard = v;
        }
        if let Some(v) = self.flush_threshold {
            info!(flush_threshold = v, "Overriding flush threshold");
            settings.flush_threshold = v;
        }
        if let Some(v) = self.worktime_secs {
            info!(worktime_secs = v, "Overriding worktime");
            settings.worktime_secs = v;
        }
        if let Some(ref v) = self.output_dir {
            info!(output_dir = %v.display(), "Overriding output dir");
            settings.output_dir = v.clone();
        }
    }
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(format!("rate must be a finite number greater than 0, got {s}"))
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "SHARDLINE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    /// JSON-lines file of entries to ingest while consuming
    #[arg(short, long, conflicts_with = "mock_entries")]
    pub input: Option<PathBuf>,

    /// Number of generated entries to ingest (0 = none)
    #[arg(long, default_value = "0", env = "SHARDLINE_MOCK_ENTRIES")]
    pub mock_entries: u64,

    /// Rate of generated entries (Hz, finite and > 0)
    #[arg(long, default_value = "10.0", value_parser = parse_rate)]
    pub mock_rate: f64,

    /// Validate settings and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SHARDLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "shardline.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when absent
    #[arg(short, long, env = "SHARDLINE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
