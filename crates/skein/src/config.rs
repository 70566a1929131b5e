//! Configuration management for skein.
//!
//! Configuration lives in `.skein/config.yaml`. Every path in it is relative
//! to the repository root (the directory containing `.skein/`).
//!
//! ```yaml
//! default-actor: alice
//! storage:
//!   backend: jsonl
//!   data_file: .skein/dependencies.jsonl
//! history_file: .skein/history.jsonl
//! estimates_file: .skein/estimates.jsonl
//! validation:
//!   fan_out_warning: 5
//! ```

use crate::error::{ConfigError, Result};
use crate::graph::{DEFAULT_FAN_OUT_WARNING, ValidationOptions};
use crate::storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the skein directory
pub const SKEIN_DIR_NAME: &str = ".skein";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the dependencies data file
pub const DEPENDENCIES_FILE_NAME: &str = "dependencies.jsonl";

/// Name of the audit log file
pub const HISTORY_FILE_NAME: &str = "history.jsonl";

/// Name of the optional estimates file
pub const ESTIMATES_FILE_NAME: &str = "estimates.jsonl";

/// Actor recorded when nothing else identifies the user
pub const UNKNOWN_ACTOR: &str = "unknown";

/// Backend name for JSONL persistence
pub const BACKEND_JSONL: &str = "jsonl";

/// Backend name for ephemeral in-memory storage
pub const BACKEND_MEMORY: &str = "memory";

/// Configuration file structure for skein
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkeinConfig {
    /// Actor used when `--actor` is not given
    #[serde(
        rename = "default-actor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_actor: Option<String>,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Audit log path
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Estimates path; the file itself is optional
    #[serde(default = "default_estimates_file")]
    pub estimates_file: String,

    /// Validation knobs
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Storage backend type (`jsonl` or `memory`)
    pub backend: String,

    /// Path to the data file
    pub data_file: String,
}

/// Validation configuration section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Warn when an issue blocks more than this many issues
    pub fan_out_warning: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            fan_out_warning: DEFAULT_FAN_OUT_WARNING,
        }
    }
}

impl From<ValidationConfig> for ValidationOptions {
    fn from(config: ValidationConfig) -> Self {
        Self {
            fan_out_warning: config.fan_out_warning,
        }
    }
}

fn default_history_file() -> String {
    format!("{SKEIN_DIR_NAME}/{HISTORY_FILE_NAME}")
}

fn default_estimates_file() -> String {
    format!("{SKEIN_DIR_NAME}/{ESTIMATES_FILE_NAME}")
}

impl StorageConfig {
    /// Resolve the configured backend against the repository root.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unknown backend name or an empty
    /// data file path.
    pub fn to_backend(&self, root: &Path) -> Result<StorageBackend> {
        match self.backend.as_str() {
            BACKEND_JSONL => {
                if self.data_file.trim().is_empty() {
                    return Err(
                        ConfigError::Invalid("storage.data_file cannot be empty".into()).into(),
                    );
                }
                Ok(StorageBackend::Jsonl(root.join(&self.data_file)))
            }
            BACKEND_MEMORY => Ok(StorageBackend::InMemory),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend '{other}' (expected '{BACKEND_JSONL}' or '{BACKEND_MEMORY}')"
            ))
            .into()),
        }
    }
}

impl SkeinConfig {
    /// Create a new configuration with the given default actor
    #[must_use]
    pub fn new(default_actor: Option<&str>) -> Self {
        Self {
            default_actor: default_actor.map(str::to_string),
            storage: StorageConfig {
                backend: BACKEND_JSONL.to_string(),
                data_file: format!("{SKEIN_DIR_NAME}/{DEPENDENCIES_FILE_NAME}"),
            },
            history_file: default_history_file(),
            estimates_file: default_estimates_file(),
            validation: ValidationConfig::default(),
        }
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the file cannot be read
    /// - `Error::Config` if it is not valid YAML or fails [`validate`](Self::validate)
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(ConfigError::from)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.validation.fan_out_warning == 0 {
            return Err(
                ConfigError::Invalid("validation.fan_out_warning must be at least 1".into()).into(),
            );
        }
        if self
            .default_actor
            .as_deref()
            .is_some_and(|actor| actor.trim().is_empty())
        {
            return Err(ConfigError::Invalid("default-actor cannot be empty".into()).into());
        }
        Ok(())
    }

    /// Absolute path of the audit log.
    #[must_use]
    pub fn history_path(&self, root: &Path) -> PathBuf {
        root.join(&self.history_file)
    }

    /// Absolute path of the estimates file.
    #[must_use]
    pub fn estimates_path(&self, root: &Path) -> PathBuf {
        root.join(&self.estimates_file)
    }

    /// Pick the actor for a mutation: the explicit flag, then
    /// `default-actor`, then `$USER`/`$USERNAME`, then `"unknown"`.
    #[must_use]
    pub fn resolve_actor(&self, flag: Option<&str>) -> String {
        let from_env = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok();
        pick_actor(flag, self.default_actor.as_deref(), from_env)
    }
}

impl Default for SkeinConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

fn pick_actor(flag: Option<&str>, configured: Option<&str>, from_env: Option<String>) -> String {
    let non_empty = |s: &&str| !s.trim().is_empty();
    flag.filter(non_empty)
        .or(configured.filter(non_empty))
        .map(|s| s.trim().to_string())
        .or(from_env.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN_ACTOR.to_string())
}
