//! Storage abstraction layer for skein.
//!
//! The flat list of dependency records is the system of record. This module
//! provides the [`DependencyStore`] trait over that list and a factory for
//! its backends:
//!
//! - **In-memory**: ephemeral, backed by a `HashMap`
//! - **JSONL**: the in-memory store plus an atomic rewrite of
//!   `dependencies.jsonl` on every `save()`
//!
//! The other collaborators the service talks to live alongside:
//! [`history`] for the audit trail and [`estimates`] for optional per-issue
//! effort estimates.
//!
//! # Test Utilities
//!
//! [`MockStore`] records how often it is written, saved and reloaded, and can
//! be told to fail saves. Enable the `test-util` feature to use it outside
//! this crate:
//!
//! ```toml
//! [dev-dependencies]
//! skein = { version = "...", features = ["test-util"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use skein::domain::{DependencyType, IssueId, NewDependency};
//! use skein::storage::{StorageBackend, create_store};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut store = create_store(StorageBackend::InMemory).await?;
//!
//!     let dep = store
//!         .insert(NewDependency {
//!             source_id: IssueId::new("proj-a"),
//!             target_id: IssueId::new("proj-b"),
//!             dep_type: DependencyType::Blocks,
//!             description: None,
//!             created_by: "alice".to_string(),
//!             created_at: Utc::now(),
//!         })
//!         .await?;
//!     println!("Created dependency: {}", dep.id);
//!
//!     Ok(())
//! }
//! ```

use crate::domain::{Dependency, DependencyId, DependencyStatus, IssueId, NewDependency};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub mod estimates;
pub mod history;
pub mod in_memory;
mod jsonl;

pub use estimates::{EstimateSource, load_estimates};
pub use history::{HistoryEntry, HistoryEvent, HistoryLog, InMemoryHistoryLog, JsonlHistoryLog};
pub use jsonl::{LoadWarning, load_from_jsonl, save_to_jsonl};

/// Durable storage of dependency records keyed by a generated ID.
///
/// Implementations must be `Send + Sync`. Mutating methods take `&mut self`;
/// `save` takes `&self` so a store can be persisted from a shared reference.
///
/// # Errors
///
/// Lookups by ID return `Ok(None)` when nothing matches. Methods that must
/// act on an existing record return `Error::DependencyNotFound` instead.
#[async_trait]
pub trait DependencyStore: Send + Sync {
    /// Store a new record as `Active`, generating its ID.
    ///
    /// Implementations **MUST** call `validate()` on the built record before
    /// storing it.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the record violates an invariant
    /// - `Error::Storage` if no unique ID can be generated
    async fn insert(&mut self, new: NewDependency) -> Result<Dependency>;

    /// Get a record by ID.
    async fn get(&self, id: &DependencyId) -> Result<Option<Dependency>>;

    /// Every record with `issue` at either end, including resolved ones,
    /// ordered by `(created_at, id)`.
    async fn list_by_issue(&self, issue: &IssueId) -> Result<Vec<Dependency>>;

    /// Every record, ordered by `(created_at, id)`.
    async fn list_all(&self) -> Result<Vec<Dependency>>;

    /// Move a record to `status`, stamping `actor` and `at` when resolving
    /// and clearing them when reactivating. Returns the updated record.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if no record has this ID
    async fn update_status(
        &mut self,
        id: &DependencyId,
        status: DependencyStatus,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Dependency>;

    /// Hard-delete a record, returning it.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if no record has this ID
    async fn delete(&mut self, id: &DependencyId) -> Result<Dependency>;

    /// Write pending changes to persistent storage. A no-op for stores
    /// without a backing file.
    async fn save(&self) -> Result<()>;

    /// Discard in-memory changes and re-read persistent storage.
    ///
    /// Called after a failed `save()` so the in-memory state matches disk
    /// again. A no-op for stores without a backing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing file cannot be read.
    async fn reload(&mut self) -> Result<()>;
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-memory storage (ephemeral)
    InMemory,

    /// JSONL file storage (persistent)
    Jsonl(PathBuf),
}

impl StorageBackend {
    /// The data file path for file-based backends.
    #[must_use]
    pub fn data_path(&self) -> Option<&Path> {
        match self {
            StorageBackend::Jsonl(path) => Some(path),
            StorageBackend::InMemory => None,
        }
    }
}

/// Adds JSONL persistence to an in-memory store.
struct JsonlBackedStore {
    inner: Box<dyn DependencyStore>,
    path: PathBuf,
}

impl JsonlBackedStore {
    async fn open(path: PathBuf) -> Result<Self> {
        let inner = load_logging_warnings(&path).await?;
        Ok(Self { inner, path })
    }
}

async fn load_logging_warnings(path: &Path) -> Result<Box<dyn DependencyStore>> {
    let (store, warnings) = load_from_jsonl(path).await?;
    for warning in &warnings {
        tracing::warn!(path = %path.display(), %warning, "Skipped dependency record");
    }
    Ok(store)
}

#[async_trait]
impl DependencyStore for JsonlBackedStore {
    async fn insert(&mut self, new: NewDependency) -> Result<Dependency> {
        self.inner.insert(new).await
    }

    async fn get(&self, id: &DependencyId) -> Result<Option<Dependency>> {
        self.inner.get(id).await
    }

    async fn list_by_issue(&self, issue: &IssueId) -> Result<Vec<Dependency>> {
        self.inner.list_by_issue(issue).await
    }

    async fn list_all(&self) -> Result<Vec<Dependency>> {
        self.inner.list_all().await
    }

    async fn update_status(
        &mut self,
        id: &DependencyId,
        status: DependencyStatus,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Dependency> {
        self.inner.update_status(id, status, actor, at).await
    }

    async fn delete(&mut self, id: &DependencyId) -> Result<Dependency> {
        self.inner.delete(id).await
    }

    async fn save(&self) -> Result<()> {
        save_to_jsonl(self.inner.as_ref(), &self.path).await
    }

    async fn reload(&mut self) -> Result<()> {
        self.inner = load_logging_warnings(&self.path).await?;
        Ok(())
    }
}

/// Create a store for the given backend.
///
/// A JSONL backend whose file does not exist yet starts empty; the file is
/// created by the first `save()`.
///
/// # Errors
///
/// - `Error::Io` if the data file exists but cannot be read
pub async fn create_store(backend: StorageBackend) -> Result<Box<dyn DependencyStore>> {
    match backend {
        StorageBackend::InMemory => Ok(in_memory::new_in_memory_store()),
        StorageBackend::Jsonl(path) => Ok(Box::new(JsonlBackedStore::open(path).await?)),
    }
}

// ========== Test Utilities ==========

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockStore;

#[cfg(any(test, feature = "test-util"))]
mod mock {
    use super::{DependencyStore, Result};
    use super::in_memory::sort_by_creation;
    use crate::domain::{Dependency, DependencyId, DependencyStatus, IssueId, NewDependency};
    use crate::error::Error;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct MockState {
        records: Vec<Dependency>,
        persisted: Vec<Dependency>,
        next_id: usize,
        writes: usize,
        saves: usize,
        reloads: usize,
        fail_saves: bool,
    }

    /// Call-counting [`DependencyStore`] with save-failure injection.
    ///
    /// Clones share state, so a test can hand one clone to the code under
    /// test and inspect the other. `reload()` restores the records as of the
    /// last successful `save()`.
    ///
    /// # Availability
    ///
    /// Compiled for this crate's tests and when the `test-util` feature is
    /// enabled.
    #[derive(Debug, Clone, Default)]
    pub struct MockStore {
        state: Arc<Mutex<MockState>>,
    }

    impl MockStore {
        /// An empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// A store preloaded (and considered saved) with `records`.
        #[must_use]
        pub fn with_records(records: Vec<Dependency>) -> Self {
            let state = MockState {
                persisted: records.clone(),
                records,
                ..MockState::default()
            };
            Self {
                state: Arc::new(Mutex::new(state)),
            }
        }

        /// Make every subsequent `save()` fail with an IO error.
        pub async fn fail_saves(&self) {
            self.state.lock().await.fail_saves = true;
        }

        /// Number of insert, update and delete calls that changed state.
        pub async fn write_calls(&self) -> usize {
            self.state.lock().await.writes
        }

        /// Number of `save()` calls, successful or not.
        pub async fn save_calls(&self) -> usize {
            self.state.lock().await.saves
        }

        /// Number of `reload()` calls.
        pub async fn reload_calls(&self) -> usize {
            self.state.lock().await.reloads
        }

        /// Current in-memory records, in insertion order.
        pub async fn records(&self) -> Vec<Dependency> {
            self.state.lock().await.records.clone()
        }
    }

    fn sorted(mut records: Vec<Dependency>) -> Vec<Dependency> {
        sort_by_creation(&mut records);
        records
    }

    #[async_trait]
    impl DependencyStore for MockStore {
        async fn insert(&mut self, new: NewDependency) -> Result<Dependency> {
            let mut state = self.state.lock().await;
            state.next_id += 1;
            let dep = new.into_dependency(DependencyId::new(format!("dep-{:06}", state.next_id)));
            dep.validate().map_err(Error::InvalidInput)?;
            state.records.push(dep.clone());
            state.writes += 1;
            Ok(dep)
        }

        async fn get(&self, id: &DependencyId) -> Result<Option<Dependency>> {
            let state = self.state.lock().await;
            Ok(state.records.iter().find(|d| &d.id == id).cloned())
        }

        async fn list_by_issue(&self, issue: &IssueId) -> Result<Vec<Dependency>> {
            let state = self.state.lock().await;
            Ok(sorted(
                state
                    .records
                    .iter()
                    .filter(|d| d.involves(issue))
                    .cloned()
                    .collect(),
            ))
        }

        async fn list_all(&self) -> Result<Vec<Dependency>> {
            Ok(sorted(self.state.lock().await.records.clone()))
        }

        async fn update_status(
            &mut self,
            id: &DependencyId,
            status: DependencyStatus,
            actor: &str,
            at: DateTime<Utc>,
        ) -> Result<Dependency> {
            let mut state = self.state.lock().await;
            let dep = state
                .records
                .iter_mut()
                .find(|d| &d.id == id)
                .ok_or_else(|| Error::DependencyNotFound(id.clone()))?;
            match status {
                DependencyStatus::Resolved => dep.resolve(actor, at),
                DependencyStatus::Active => dep.reactivate(),
            }
            let updated = dep.clone();
            state.writes += 1;
            Ok(updated)
        }

        async fn delete(&mut self, id: &DependencyId) -> Result<Dependency> {
            let mut state = self.state.lock().await;
            let pos = state
                .records
                .iter()
                .position(|d| &d.id == id)
                .ok_or_else(|| Error::DependencyNotFound(id.clone()))?;
            state.writes += 1;
            Ok(state.records.remove(pos))
        }

        async fn save(&self) -> Result<()> {
            let mut state = self.state.lock().await;
            state.saves += 1;
            if state.fail_saves {
                return Err(Error::Io(std::io::Error::other("injected save failure")));
            }
            state.persisted = state.records.clone();
            Ok(())
        }

        async fn reload(&mut self) -> Result<()> {
            let mut state = self.state.lock().await;
            state.reloads += 1;
            state.records = state.persisted.clone();
            Ok(())
        }
    }
}
