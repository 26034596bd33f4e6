//! Runtime configuration file.
//!
//! ```toml
//! [intake]
//! host = "0.0.0.0"
//! port = 3021
//! max_body_size = 65536
//! queue_capacity = 1024
//! ack_timeout = "30s"
//! ```
//!
//! Every key is optional. A missing file argument means defaults throughout.

use lw_pubsub_adapter::IntakeConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub intake: IntakeConfig,
}

/// Errors loading the runtime configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {error}")]
    Io { path: String, error: String },

    #[error("invalid config file: {0}")]
    Parse(String),

    #[error(transparent)]
    Intake(#[from] lw_pubsub_adapter::ConfigError),
}

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.intake.validate()?;
        Ok(config)
    }
}
