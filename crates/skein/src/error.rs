//! Error types for skein operations.
//!
//! Validation and not-found errors are raised before any store call is made.
//! Store, IO and configuration errors are propagated unchanged.

use crate::domain::{DependencyId, IssueId};
use crate::id_generation::IdGenerationError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for skein operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A dependency would connect an issue to itself.
    #[error("Issue {0} cannot depend on itself")]
    SelfDependency(IssueId),

    /// Dependency type string was neither `blocks` nor `requires`.
    #[error("Invalid dependency type '{0}': expected 'blocks' or 'requires'")]
    InvalidDependencyType(String),

    /// Malformed input (empty ID, missing actor, oversized description).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No dependency with this ID exists.
    #[error("Dependency not found: {0}")]
    DependencyNotFound(DependencyId),

    /// No dependency connects the two issues.
    #[error("No dependency between {from} and {to}")]
    DependencyBetweenNotFound {
        /// Source issue as given by the caller
        from: IssueId,
        /// Target issue as given by the caller
        to: IssueId,
    },

    /// Record store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the caller supplied bad input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SelfDependency(_) | Self::InvalidDependencyType(_) | Self::InvalidInput(_)
        )
    }

    /// Whether the referenced dependency does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::DependencyNotFound(_) | Self::DependencyBetweenNotFound { .. }
        )
    }
}

/// Errors raised by a [`DependencyStore`](crate::storage::DependencyStore) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Persisted data is not in the expected shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A record could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record with this ID is already stored.
    #[error("Duplicate dependency ID: {0}")]
    DuplicateId(DependencyId),

    /// No unique dependency ID could be generated.
    #[error("ID generation failed: {0}")]
    IdGeneration(#[from] IdGenerationError),
}

/// Errors raised while locating or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.skein` directory in the current directory or any parent.
    #[error("Not a skein repository (or any parent). Run 'skein init' first.")]
    NotInitialized,

    /// `init` found an existing `.skein` directory.
    #[error("Skein is already initialized in {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The configuration file is not valid YAML.
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<skein_jsonl::Error> for Error {
    fn from(err: skein_jsonl::Error) -> Self {
        match err {
            skein_jsonl::Error::Io(e) => Self::Io(e),
            skein_jsonl::Error::Json(e) => Self::Json(e),
            skein_jsonl::Error::InvalidFormat(msg) => StorageError::InvalidFormat(msg).into(),
        }
    }
}

/// A specialized Result type for skein operations.
pub type Result<T> = std::result::Result<T, Error>;
