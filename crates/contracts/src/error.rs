//! Layered error definitions
//!
//! Categorized by source: config / ack / artifact

use thiserror::Error;

use crate::WorkerId;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Broker Errors =====
    /// Acknowledgment was rejected by the broker
    #[error("failed to ack delivery {tag}: {message}")]
    AckFailed { tag: u64, message: String },

    // ===== Artifact Errors =====
    /// Durable write of a batch failed
    #[error("worker {worker} failed to write artifact: {message}")]
    ArtifactWrite { worker: WorkerId, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create ack failure error
    pub fn ack_failed(tag: u64, message: impl Into<String>) -> Self {
        Self::AckFailed {
            tag,
            message: message.into(),
        }
    }

    /// Create artifact write error
    pub fn artifact_write(worker: WorkerId, message: impl Into<String>) -> Self {
        Self::ArtifactWrite {
            worker,
            message: message.into(),
        }
    }
}
