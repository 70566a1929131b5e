//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that wires configuration, storage,
//! the audit log and estimates into a [`DependencyService`].
//!
//! # Example
//!
//! ```no_run
//! use skein::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let result = app.service().validate_dependency_graph().await?;
//!     println!("valid: {}", result.is_valid);
//!     Ok(())
//! }
//! ```

use crate::commands::init::find_skein_root;
use crate::config::{CONFIG_FILE_NAME, SKEIN_DIR_NAME, SkeinConfig};
use crate::error::{ConfigError, Result};
use crate::service::DependencyService;
use crate::storage::{JsonlHistoryLog, create_store, load_estimates};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
///
/// Everything is loaded once per invocation; nothing is cached across runs.
#[derive(Debug)]
pub struct App {
    service: DependencyService,

    /// Directory containing `.skein/`
    root_dir: PathBuf,

    config: SkeinConfig,
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree to find a `.skein/` directory, loads
    /// configuration, opens storage and the audit log, and reads estimates if
    /// the estimates file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No skein repository is found in the directory tree
    /// - Configuration cannot be loaded
    /// - Storage initialization fails
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_skein_root(working_dir).ok_or(ConfigError::NotInitialized)?;
        let config_path = root_dir.join(SKEIN_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = SkeinConfig::load(&config_path).await?;

        let backend = config.storage.to_backend(&root_dir)?;
        tracing::debug!(root = %root_dir.display(), ?backend, "Opening skein repository");
        let store = create_store(backend).await?;
        let estimates = load_estimates(&config.estimates_path(&root_dir)).await?;

        let service = DependencyService::new(store)
            .with_history(JsonlHistoryLog::new(config.history_path(&root_dir)))
            .with_estimates(estimates)
            .with_options(config.validation.into());

        Ok(Self {
            service,
            root_dir,
            config,
        })
    }

    /// The dependency service.
    #[must_use]
    pub fn service(&self) -> &DependencyService {
        &self.service
    }

    /// The dependency service, for mutations.
    pub fn service_mut(&mut self) -> &mut DependencyService {
        &mut self.service
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &SkeinConfig {
        &self.config
    }

    /// Directory containing `.skein/`.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Path to the `.skein` directory.
    #[must_use]
    pub fn skein_dir(&self) -> PathBuf {
        self.root_dir.join(SKEIN_DIR_NAME)
    }

    /// Actor for a mutation, see [`SkeinConfig::resolve_actor`].
    #[must_use]
    pub fn actor(&self, flag: Option<&str>) -> String {
        self.config.resolve_actor(flag)
    }
}
