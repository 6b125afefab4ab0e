//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Settings failed to load or validate
    #[error("Invalid settings: {0}")]
    Settings(#[from] contracts::ContractError),

    /// A line of the input file is not a valid entry
    #[error("{path}:{line}: invalid entry: {source}")]
    InputParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Entry feed could not be started
    #[error("Entry feed error: {0}")]
    Feed(#[from] ingestion::IngestionError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn input_parse(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::InputParse {
            path: path.into(),
            line,
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
