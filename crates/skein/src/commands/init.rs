//! Implementation of the `init` command.
//!
//! This module handles initialization of a new skein repository, creating
//! the `.skein/` directory with configuration and an empty dependency file.

use crate::config::{
    CONFIG_FILE_NAME, DEPENDENCIES_FILE_NAME, SKEIN_DIR_NAME, SkeinConfig,
};
use crate::error::{ConfigError, Error, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within .skein
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for skein root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created skein directory
    pub skein_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created dependencies file
    pub dependencies_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
    /// Default actor written to the config, if any
    pub default_actor: Option<String>,
}

/// Initialize a new skein repository in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.skein/` directory already exists
/// - The default actor is blank
/// - File system operations fail
pub async fn init(base_dir: &Path, default_actor: Option<&str>) -> Result<InitResult> {
    let default_actor = default_actor.map(str::trim);
    if default_actor.is_some_and(str::is_empty) {
        return Err(Error::InvalidInput("default actor cannot be empty".into()));
    }

    let skein_dir = base_dir.join(SKEIN_DIR_NAME);
    if skein_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(skein_dir).into());
    }

    fs::create_dir_all(&skein_dir).await?;

    let config_file = skein_dir.join(CONFIG_FILE_NAME);
    SkeinConfig::new(default_actor).save(&config_file).await?;

    let dependencies_file = skein_dir.join(DEPENDENCIES_FILE_NAME);
    fs::write(&dependencies_file, "").await?;

    let gitignore_file = skein_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Skein metadata files that should not be tracked
# dependencies.jsonl and history.jsonl should be tracked for collaboration
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::info!(dir = %skein_dir.display(), "Initialized skein repository");

    Ok(InitResult {
        skein_dir,
        config_file,
        dependencies_file,
        gitignore_file,
        default_actor: default_actor.map(str::to_string),
    })
}

/// Check if a directory has been initialized with skein.
#[must_use]
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(SKEIN_DIR_NAME).exists()
}

/// Find the skein root directory by searching up the directory tree.
///
/// Returns the directory containing `.skein/`, or `None` if the filesystem
/// root or the depth limit is reached first.
#[must_use]
pub fn find_skein_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(SKEIN_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_directory_structure() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        assert!(result.skein_dir.exists());
        assert!(result.config_file.exists());
        assert!(result.dependencies_file.exists());
        assert!(result.gitignore_file.exists());
        assert!(result.default_actor.is_none());
    }

    #[tokio::test]
    async fn test_init_with_default_actor() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), Some(" alice ")).await.unwrap();

        assert_eq!(result.default_actor.as_deref(), Some("alice"));
        let config = SkeinConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.default_actor.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_init_rejects_blank_actor() {
        let temp_dir = TempDir::new().unwrap();

        let err = init(temp_dir.path(), Some("   ")).await.unwrap_err();

        assert!(err.is_validation());
        assert!(!is_initialized(temp_dir.path()));
    }

    #[tokio::test]
    async fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path(), None).await.unwrap();
        let err = init(temp_dir.path(), None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Config(ConfigError::AlreadyInitialized(_))
        ));
        assert!(err.to_string().to_lowercase().contains("already initialized"));
    }

    #[tokio::test]
    async fn test_init_creates_empty_dependencies_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), None).await.unwrap();

        let content = tokio::fs::read_to_string(&result.dependencies_file)
            .await
            .unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_is_initialized() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_initialized(temp_dir.path()));

        std::fs::create_dir(temp_dir.path().join(SKEIN_DIR_NAME)).unwrap();
        assert!(is_initialized(temp_dir.path()));
    }

    #[test]
    fn test_find_skein_root_in_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(SKEIN_DIR_NAME)).unwrap();

        let sub_dir = temp_dir.path().join("sub").join("nested");
        std::fs::create_dir_all(&sub_dir).unwrap();

        assert_eq!(find_skein_root(&sub_dir), Some(temp_dir.path().to_path_buf()));
        assert_eq!(
            find_skein_root(temp_dir.path()),
            Some(temp_dir.path().to_path_buf())
        );
    }

    #[test]
    fn test_find_skein_root_ignores_plain_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(SKEIN_DIR_NAME), "").unwrap();

        assert!(find_skein_root(temp_dir.path()).is_none());
    }
}
