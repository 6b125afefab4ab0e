//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use contracts::ConsumerSettings;
use tracing::info;

use crate::cli::SettingsOverrides;
use crate::error::{CliError, Result};

/// Load settings from `config` (or defaults), apply overrides, validate.
pub(crate) fn load_settings(
    config: Option<&Path>,
    overrides: &SettingsOverrides,
) -> Result<ConsumerSettings> {
    let mut settings = match config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading configuration");
            config_loader::ConfigLoader::load_from_path(path)?
        }
        None => {
            info!("No configuration file, using defaults");
            ConsumerSettings::default()
        }
    };

    overrides.apply(&mut settings);
    config_loader::validate(&settings)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_settings_defaults() {
        let settings = load_settings(None, &SettingsOverrides::default()).unwrap();
        assert_eq!(settings, ConsumerSettings::default());
    }

    #[test]
    fn test_load_settings_file_then_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "shard_count = 2\nflush_threshold = 7").unwrap();

        let overrides = SettingsOverrides {
            flush_threshold: Some(3),
            ..Default::default()
        };
        let settings = load_settings(Some(file.path()), &overrides).unwrap();
        assert_eq!(settings.shard_count, 2);
        assert_eq!(settings.flush_threshold, 3);
        assert_eq!(settings.workers_per_shard, 3);
    }

    #[test]
    fn test_load_settings_missing_file() {
        let result = load_settings(Some(Path::new("/nonexistent/shardline.toml")), &SettingsOverrides::default());
        assert!(matches!(result, Err(CliError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_override_revalidated() {
        let overrides = SettingsOverrides {
            workers_per_shard: Some(0),
            ..Default::default()
        };
        let result = load_settings(None, &overrides);
        assert!(matches!(result, Err(CliError::Settings(_))));
    }
}
