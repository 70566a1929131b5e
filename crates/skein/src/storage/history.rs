//! Audit trail of dependency mutations.
//!
//! Every mutation the service performs is followed by one [`HistoryEntry`].
//! Recording is best-effort: the service turns a failed `record` into a
//! warning and never undoes the mutation.

use crate::domain::{DependencyId, IssueId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skein_jsonl::{append_jsonl, read_jsonl_resilient};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Kind of mutation an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    /// A dependency was created
    DependencyCreated,
    /// A dependency was hard-deleted
    DependencyRemoved,
    /// A dependency moved to resolved
    DependencyResolved,
    /// A resolved dependency became active again
    DependencyReactivated,
}

impl HistoryEvent {
    /// Snake-case wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DependencyCreated => "dependency_created",
            Self::DependencyRemoved => "dependency_removed",
            Self::DependencyResolved => "dependency_resolved",
            Self::DependencyReactivated => "dependency_reactivated",
        }
    }
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// What happened
    pub event: HistoryEvent,
    /// Issue the entry is filed under (the dependency's source)
    pub issue_id: IssueId,
    /// Dependency the mutation touched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_id: Option<DependencyId>,
    /// Human-readable summary
    pub message: String,
    /// Who performed the mutation
    pub actor: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

/// Sink for audit entries.
#[async_trait]
pub trait HistoryLog: Send + Sync {
    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    async fn record(&self, entry: HistoryEntry) -> Result<()>;

    /// Every entry recorded so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    async fn entries(&self) -> Result<Vec<HistoryEntry>>;
}

/// Append-only JSONL audit log.
#[derive(Debug, Clone)]
pub struct JsonlHistoryLog {
    path: PathBuf,
}

impl JsonlHistoryLog {
    /// Log backed by `path`; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryLog for JsonlHistoryLog {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        append_jsonl(&self.path, &entry).await?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        match read_jsonl_resilient::<HistoryEntry, _>(&self.path).await {
            Ok((entries, warnings)) => {
                for warning in &warnings {
                    tracing::warn!(path = %self.path.display(), %warning, "Skipped history entry");
                }
                Ok(entries)
            }
            Err(skein_jsonl::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory audit log. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryLog {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl InMemoryHistoryLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryLog for InMemoryHistoryLog {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        self.entries.lock().await.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}
