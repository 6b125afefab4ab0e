//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{ConsumerSettings, ShardId};
use serde::Serialize;

use super::load_settings;
use crate::cli::InfoArgs;

/// Effective settings for JSON output
#[derive(Serialize)]
struct SettingsInfo {
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_path: Option<String>,
    settings: ConsumerSettings,
    total_workers: usize,
    queues: Vec<String>,
    artifact_pattern: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref(), &args.overrides)
        .context("Failed to load settings")?;
    let info = build_info(settings, args);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize settings info")?;
        println!("{}", json);
    } else {
        print_info(&info);
    }

    Ok(())
}

fn build_info(settings: ConsumerSettings, args: &InfoArgs) -> SettingsInfo {
    let queues = ShardId::all(settings.shard_count)
        .map(broker::queue_name)
        .collect();
    let artifact_pattern = format!(
        "{}/<shard>-<worker>_<suffix>.txt",
        settings.output_dir.display()
    );

    SettingsInfo {
        version: env!("CARGO_PKG_VERSION"),
        config_path: args.config.as_ref().map(|p| p.display().to_string()),
        total_workers: settings.total_workers(),
        settings,
        queues,
        artifact_pattern,
    }
}

fn print_info(info: &SettingsInfo) {
    let settings = &info.settings;
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Shardline Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⚙️  Settings");
    match info.config_path {
        Some(ref path) => println!("   ├─ Config: {}", path),
        None => println!("   ├─ Config: (defaults)"),
    }
    println!("   ├─ Shards: {}", settings.shard_count);
    println!("   ├─ Workers per shard: {}", settings.workers_per_shard);
    println!("   ├─ Total workers: {}", info.total_workers);
    println!("   ├─ Flush threshold: {}", settings.flush_threshold);
    println!("   └─ Worktime: {}s", settings.worktime_secs);

    println!("\n📥 Queues ({})", info.queues.len());
    for (i, queue) in info.queues.iter().enumerate() {
        let prefix = if i == info.queues.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}", prefix, queue);
    }

    println!("\n📤 Artifacts");
    println!("   └─ {}", info.artifact_pattern);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::SettingsOverrides;

    #[test]
    fn test_build_info_lists_queues() {
        let args = InfoArgs {
            config: None,
            overrides: SettingsOverrides::default(),
            json: true,
        };
        let settings = ConsumerSettings {
            shard_count: 3,
            workers_per_shard: 2,
            ..Default::default()
        };
        let info = build_info(settings, &args);

        assert_eq!(info.total_workers, 6);
        assert_eq!(info.queues, vec!["task_queue_0", "task_queue_1", "task_queue_2"]);
        assert!(info.config_path.is_none());
    }
}
