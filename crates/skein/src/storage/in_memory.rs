//! In-memory dependency store.
//!
//! Records are held in a `HashMap` keyed by ID and lost when the process
//! exits unless the store is wrapped by the JSONL backend. The inner state
//! sits behind `Arc<Mutex<_>>`, so the store is `Send + Sync` and `save()`
//! can run from a shared reference.

use super::DependencyStore;
use crate::domain::{Dependency, DependencyId, DependencyStatus, IssueId, NewDependency};
use crate::error::{Error, Result, StorageError};
use crate::id_generation::{DEPENDENCY_ID_PREFIX, IdGenerator, IdGeneratorConfig};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Inner store state (not thread-safe on its own).
#[derive(Debug)]
pub(crate) struct InMemoryStoreInner {
    /// Records indexed by ID
    records: HashMap<DependencyId, Dependency>,

    /// Generator for new record IDs; knows every stored ID
    id_generator: IdGenerator,
}

impl InMemoryStoreInner {
    pub(crate) fn new() -> Self {
        Self {
            records: HashMap::new(),
            id_generator: IdGenerator::new(IdGeneratorConfig {
                prefix: DEPENDENCY_ID_PREFIX.to_string(),
                database_size: 0,
            }),
        }
    }

    /// Add an already-identified record, e.g. one read from disk.
    pub(crate) fn import(&mut self, dep: Dependency) -> Result<()> {
        if self.records.contains_key(&dep.id) {
            return Err(StorageError::DuplicateId(dep.id).into());
        }
        self.id_generator.register_id(dep.id.as_str());
        self.records.insert(dep.id.clone(), dep);
        self.id_generator.set_database_size(self.records.len());
        Ok(())
    }
}

/// Order records by `(created_at, id)`.
pub(crate) fn sort_by_creation(records: &mut [Dependency]) {
    records.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
}

/// Thread-safe in-memory store.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create an empty in-memory store.
///
/// # Example
///
/// ```
/// use skein::storage::in_memory::new_in_memory_store;
///
/// let store = new_in_memory_store();
/// ```
#[must_use]
pub fn new_in_memory_store() -> Box<dyn DependencyStore> {
    Box::new(Arc::new(Mutex::new(InMemoryStoreInner::new())))
}

#[async_trait]
impl DependencyStore for InMemoryStore {
    async fn insert(&mut self, new: NewDependency) -> Result<Dependency> {
        let mut inner = self.lock().await;

        let id = inner
            .id_generator
            .generate(
                new.source_id.as_str(),
                new.target_id.as_str(),
                new.dep_type.as_str(),
            )
            .map_err(StorageError::from)?;
        let dep = new.into_dependency(DependencyId::new(id));
        if let Err(reason) = dep.validate() {
            inner.id_generator.unregister_id(dep.id.as_str());
            return Err(Error::InvalidInput(reason));
        }

        inner.records.insert(dep.id.clone(), dep.clone());
        let size = inner.records.len();
        inner.id_generator.set_database_size(size);
        debug!(id = %dep.id, "Inserted dependency");
        Ok(dep)
    }

    async fn get(&self, id: &DependencyId) -> Result<Option<Dependency>> {
        Ok(self.lock().await.records.get(id).cloned())
    }

    async fn list_by_issue(&self, issue: &IssueId) -> Result<Vec<Dependency>> {
        let inner = self.lock().await;
        let mut matching: Vec<Dependency> = inner
            .records
            .values()
            .filter(|dep| dep.involves(issue))
            .cloned()
            .collect();
        sort_by_creation(&mut matching);
        Ok(matching)
    }

    async fn list_all(&self) -> Result<Vec<Dependency>> {
        let mut all: Vec<Dependency> = self.lock().await.records.values().cloned().collect();
        sort_by_creation(&mut all);
        Ok(all)
    }

    async fn update_status(
        &mut self,
        id: &DependencyId,
        status: DependencyStatus,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<Dependency> {
        let mut inner = self.lock().await;
        let dep = inner
            .records
            .get_mut(id)
            .ok_or_else(|| Error::DependencyNotFound(id.clone()))?;

        match status {
            DependencyStatus::Resolved => dep.resolve(actor, at),
            DependencyStatus::Active => dep.reactivate(),
        }
        Ok(dep.clone())
    }

    async fn delete(&mut self, id: &DependencyId) -> Result<Dependency> {
        let mut inner = self.lock().await;
        let dep = inner
            .records
            .remove(id)
            .ok_or_else(|| Error::DependencyNotFound(id.clone()))?;
        inner.id_generator.unregister_id(id.as_str());
        let size = inner.records.len();
        inner.id_generator.set_database_size(size);
        Ok(dep)
    }

    async fn save(&self) -> Result<()> {
        // Nothing to persist without a backing file.
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyType;
    use crate::id_generation::validate_id;
    use chrono::TimeZone;

    fn new_dep(from: &str, to: &str, minute: u32) -> NewDependency {
        NewDependency {
            source_id: IssueId::new(from),
            target_id: IssueId::new(to),
            dep_type: DependencyType::Requires,
            description: Some("needs the schema".to_string()),
            created_by: "alice".to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_prefixed_id_and_active_status() {
        let mut store = new_in_memory_store();
        let dep = store.insert(new_dep("a", "b", 0)).await.unwrap();

        assert!(validate_id(dep.id.as_str(), DEPENDENCY_ID_PREFIX));
        assert_eq!(dep.status, DependencyStatus::Active);
        assert_eq!(dep.description.as_deref(), Some("needs the schema"));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_record() {
        let mut store = new_in_memory_store();
        let err = store.insert(new_dep("a", "a", 0)).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_issue_matches_either_end_in_creation_order() {
        let mut store = new_in_memory_store();
        let late = store.insert(new_dep("a", "b", 30)).await.unwrap();
        let early = store.insert(new_dep("c", "a", 10)).await.unwrap();
        store.insert(new_dep("x", "y", 0)).await.unwrap();

        let listed = store.list_by_issue(&IssueId::new("a")).await.unwrap();
        assert_eq!(listed, vec![early, late]);
    }

    #[tokio::test]
    async fn test_update_status_round_trip() {
        let mut store = new_in_memory_store();
        let dep = store.insert(new_dep("a", "b", 0)).await.unwrap();
        let at = Utc::now();

        let resolved = store
            .update_status(&dep.id, DependencyStatus::Resolved, "bob", at)
            .await
            .unwrap();
        assert_eq!(resolved.resolved_by.as_deref(), Some("bob"));
        assert_eq!(resolved.resolved_at, Some(at));

        let active = store
            .update_status(&dep.id, DependencyStatus::Active, "bob", at)
            .await
            .unwrap();
        assert_eq!(active, dep);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let mut store = new_in_memory_store();
        let id = DependencyId::new("dep-000000");

        assert_eq!(store.get(&id).await.unwrap(), None);
        assert!(store.delete(&id).await.unwrap_err().is_not_found());
        assert!(
            store
                .update_status(&id, DependencyStatus::Resolved, "bob", Utc::now())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let mut store = new_in_memory_store();
        let dep = store.insert(new_dep("a", "b", 0)).await.unwrap();

        assert_eq!(store.delete(&dep.id).await.unwrap(), dep);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_duplicate_ids() {
        let mut inner = InMemoryStoreInner::new();
        let dep = new_dep("a", "b", 0).into_dependency(DependencyId::new("dep-aaaaaa"));

        inner.import(dep.clone()).unwrap();
        let err = inner.import(dep).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::DuplicateId(_))));
    }
}
