//! JSONL persistence for the in-memory store.
//!
//! `dependencies.jsonl` holds one [`Dependency`] per line. Saving rewrites
//! the whole file atomically with records ordered by `(created_at, id)`, so
//! unchanged data produces byte-identical files.

use super::DependencyStore;
use super::in_memory::{InMemoryStoreInner, sort_by_creation};
use crate::domain::{Dependency, DependencyId};
use crate::error::{Error, Result, StorageError};
use skein_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Non-fatal problems found while loading a data file.
///
/// The offending line or record is skipped; everything else loads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line was not a valid dependency record.
    MalformedJson {
        /// 1-based line number in the file
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A record parsed but broke a record invariant.
    InvalidRecord {
        /// ID of the skipped record
        id: DependencyId,
        /// 1-based position among the successfully parsed records
        record_number: usize,
        /// Violated invariant
        error: String,
    },

    /// A second record reused an ID already loaded; the later one is skipped.
    DuplicateId {
        /// The repeated ID
        id: DependencyId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed record: {error}")
            }
            Self::InvalidRecord {
                id,
                record_number,
                error,
            } => write!(f, "record {record_number} ({id}): {error}"),
            Self::DuplicateId { id } => write!(f, "duplicate dependency ID {id}"),
        }
    }
}

/// Load a store from a JSONL file.
///
/// A missing file yields an empty store and no warnings.
///
/// # Errors
///
/// Returns `Error::Io` if the file exists but cannot be read.
pub async fn load_from_jsonl(path: &Path) -> Result<(Box<dyn DependencyStore>, Vec<LoadWarning>)> {
    let (parsed, jsonl_warnings) = match read_jsonl_resilient::<Dependency, _>(path).await {
        Ok(result) => result,
        Err(skein_jsonl::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            (Vec::new(), Vec::new())
        }
        Err(e) => return Err(e.into()),
    };

    let mut warnings: Vec<LoadWarning> = jsonl_warnings
        .into_iter()
        .map(|warning| match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                LoadWarning::MalformedJson { line_number, error }
            }
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => LoadWarning::MalformedJson {
                line_number,
                error: reason,
            },
        })
        .collect();

    let mut inner = InMemoryStoreInner::new();
    for (index, dep) in parsed.into_iter().enumerate() {
        if let Err(error) = dep.validate() {
            warnings.push(LoadWarning::InvalidRecord {
                id: dep.id,
                record_number: index + 1,
                error,
            });
            continue;
        }
        let id = dep.id.clone();
        match inner.import(dep) {
            Ok(()) => {}
            Err(Error::Storage(StorageError::DuplicateId(_))) => {
                warnings.push(LoadWarning::DuplicateId { id });
            }
            Err(e) => return Err(e),
        }
    }

    Ok((Box::new(Arc::new(Mutex::new(inner))), warnings))
}

/// Atomically write every record in `store` to `path`.
///
/// # Errors
///
/// Returns an error if the store cannot be listed, a record fails to
/// serialize, or the file cannot be written. On failure the previous file is
/// left in place.
pub async fn save_to_jsonl(store: &dyn DependencyStore, path: &Path) -> Result<()> {
    let mut records = store.list_all().await?;
    sort_by_creation(&mut records);
    write_jsonl_atomic(path, &records).await?;
    tracing::debug!(path = %path.display(), records = records.len(), "Saved dependencies");
    Ok(())
}
