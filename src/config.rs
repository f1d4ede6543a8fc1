//! Engine configuration, loaded from TOML.
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// sled database directory.
    pub database_path: PathBuf,
    /// Prefix for blob keys written by ingestion.
    pub blob_namespace: String,
    /// Evaluate completion after every successful signature.
    pub auto_complete: bool,
    /// Upper bound for a single collaborator call. `LedgerNotarizer` takes it
    /// at construction; remote blob stores must enforce it too (see `BlobStore`).
    pub collaborator_timeout_ms: u64,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("cosign.db"),
            blob_namespace: "docs".to_string(),
            auto_complete: true,
            collaborator_timeout_ms: 10_000,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blob_namespace.trim().is_empty() {
            return Err(ConfigError::Validation(
                "blob_namespace must not be empty".to_string(),
            ));
        }
        if self.blob_namespace.contains('/') {
            return Err(ConfigError::Validation(
                "blob_namespace must be a single path segment".to_string(),
            ));
        }
        if self.collaborator_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "collaborator_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn open_database(&self) -> Result<sled::Db, sled::Error> {
        sled::open(&self.database_path)
    }
}
