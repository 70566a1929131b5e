//! Dependency service: the façade the CLI talks to.
//!
//! Writes go to the [`DependencyStore`], are saved, and are then followed by
//! a best-effort audit entry. Reads rebuild a [`DependencyGraph`] from the
//! current records every time; nothing is cached between calls.
//!
//! # Failure semantics
//!
//! - Input is validated before the store is touched.
//! - A failed `save()` triggers `reload()` so the store matches disk again,
//!   then the save error is returned unchanged.
//! - A failed audit write never fails the mutation. It is logged and
//!   returned in [`Mutation::warnings`].
//!
//! # Example
//!
//! ```no_run
//! use skein::domain::{DependencyType, IssueId};
//! use skein::service::DependencyService;
//! use skein::storage::{InMemoryHistoryLog, StorageBackend, create_store};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_store(StorageBackend::InMemory).await?;
//!     let mut service = DependencyService::new(store).with_history(InMemoryHistoryLog::new());
//!
//!     let a = IssueId::new("proj-a");
//!     let b = IssueId::new("proj-b");
//!     service.create(&a, &b, DependencyType::Blocks, None, "alice").await?;
//!
//!     let info = service.get_blocking_info(&b).await?;
//!     assert!(info.is_blocked);
//!     Ok(())
//! }
//! ```

use crate::domain::{
    BlockingInfo, Dependency, DependencyId, DependencyStats, DependencyStatus, DependencyType,
    ImpactAnalysis, IssueId, MAX_DESCRIPTION_LENGTH, NewDependency, ValidationResult,
};
use crate::error::{Error, Result};
use crate::graph::{
    DependencyGraph, GraphSnapshot, StatsFilter, ValidationOptions, aggregate, analyze_impact,
    resolve_blocking, validate,
};
use crate::storage::{DependencyStore, EstimateSource, HistoryEntry, HistoryEvent, HistoryLog};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

/// Result of a write: the affected value plus non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mutation<T> {
    /// What the mutation produced or touched
    pub value: T,
    /// Problems that did not stop the mutation (e.g. audit failures)
    pub warnings: Vec<String>,
}

impl<T> Mutation<T> {
    fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }
}

/// Façade over the record store, the audit log and the graph algorithms.
pub struct DependencyService {
    store: Box<dyn DependencyStore>,
    history: Option<Box<dyn HistoryLog>>,
    estimates: Option<Box<dyn EstimateSource>>,
    options: ValidationOptions,
}

impl std::fmt::Debug for DependencyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyService")
            .field("store", &"<dyn DependencyStore>")
            .field("history", &self.history.is_some())
            .field("estimates", &self.estimates.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl DependencyService {
    /// Service over `store` with no audit log and no estimates.
    #[must_use]
    pub fn new(store: Box<dyn DependencyStore>) -> Self {
        Self {
            store,
            history: None,
            estimates: None,
            options: ValidationOptions::default(),
        }
    }

    /// Record an audit entry after every mutation.
    #[must_use]
    pub fn with_history(mut self, log: impl HistoryLog + 'static) -> Self {
        self.history = Some(Box::new(log));
        self
    }

    /// Use `source` for impact delay estimates.
    #[must_use]
    pub fn with_estimates(mut self, source: impl EstimateSource + 'static) -> Self {
        self.estimates = Some(Box::new(source));
        self
    }

    /// Override validation knobs.
    #[must_use]
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn DependencyStore {
        self.store.as_ref()
    }

    // ========== Mutations ==========

    /// Create an active dependency `source -> target`.
    ///
    /// # Errors
    ///
    /// - `Error::SelfDependency` if `source == target`
    /// - `Error::InvalidInput` for empty IDs or author, or an oversized
    ///   description
    /// - store errors, unchanged
    pub async fn create(
        &mut self,
        source: &IssueId,
        target: &IssueId,
        dep_type: DependencyType,
        description: Option<String>,
        author: &str,
    ) -> Result<Mutation<Dependency>> {
        require_non_empty("source issue ID", source.as_str())?;
        require_non_empty("target issue ID", target.as_str())?;
        require_non_empty("author", author)?;
        if source == target {
            return Err(Error::SelfDependency(source.clone()));
        }
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if description
            .as_ref()
            .is_some_and(|d| d.len() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(Error::InvalidInput(format!(
                "description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        let dep = self
            .store
            .insert(NewDependency {
                source_id: source.clone(),
                target_id: target.clone(),
                dep_type,
                description,
                created_by: author.to_string(),
                created_at: Utc::now(),
            })
            .await?;
        self.persist().await?;
        info!(id = %dep.id, source = %source, target = %target, %dep_type, "Created dependency");

        let message = format!("{source} {dep_type} {target}");
        let warnings = self
            .audit(HistoryEvent::DependencyCreated, &dep, message, author)
            .await;
        Ok(Mutation {
            value: dep,
            warnings,
        })
    }

    /// [`create`](Self::create) with the type given as text
    /// (`"blocks"`/`"requires"`, case-insensitive).
    ///
    /// # Errors
    ///
    /// - `Error::InvalidDependencyType` for any other type string
    /// - everything [`create`](Self::create) returns
    pub async fn create_from_str(
        &mut self,
        source: &IssueId,
        target: &IssueId,
        dep_type: &str,
        description: Option<String>,
        author: &str,
    ) -> Result<Mutation<Dependency>> {
        let dep_type: DependencyType = dep_type.parse()?;
        self.create(source, target, dep_type, description, author)
            .await
    }

    /// Hard-delete a dependency.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if the ID is unknown
    /// - `Error::InvalidInput` for an empty author
    pub async fn remove(&mut self, id: &DependencyId, author: &str) -> Result<Mutation<Dependency>> {
        require_non_empty("author", author)?;
        let dep = self.store.delete(id).await?;
        self.persist().await?;
        info!(id = %dep.id, "Removed dependency");

        let message = format!(
            "removed {} {} {}",
            dep.source_id, dep.dep_type, dep.target_id
        );
        let warnings = self
            .audit(HistoryEvent::DependencyRemoved, &dep, message, author)
            .await;
        Ok(Mutation {
            value: dep,
            warnings,
        })
    }

    /// Hard-delete every dependency connecting two issues, in either
    /// direction and of either type.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyBetweenNotFound` if the issues are not connected
    /// - `Error::InvalidInput` for an empty author
    pub async fn remove_between(
        &mut self,
        source: &IssueId,
        target: &IssueId,
        author: &str,
    ) -> Result<Mutation<Vec<Dependency>>> {
        require_non_empty("author", author)?;
        let matching: Vec<Dependency> = self
            .store
            .list_by_issue(source)
            .await?
            .into_iter()
            .filter(|dep| dep.connects(source, target))
            .collect();
        if matching.is_empty() {
            return Err(Error::DependencyBetweenNotFound {
                from: source.clone(),
                to: target.clone(),
            });
        }

        let mut removed = Vec::with_capacity(matching.len());
        for dep in &matching {
            match self.store.delete(&dep.id).await {
                Ok(dep) => removed.push(dep),
                Err(err) => {
                    self.rollback().await;
                    return Err(err);
                }
            }
        }
        self.persist().await?;
        info!(source = %source, target = %target, count = removed.len(), "Removed dependencies between issues");

        let mut warnings = Vec::new();
        for dep in &removed {
            let message = format!(
                "removed {} {} {}",
                dep.source_id, dep.dep_type, dep.target_id
            );
            warnings.extend(
                self.audit(HistoryEvent::DependencyRemoved, dep, message, author)
                    .await,
            );
        }
        Ok(Mutation {
            value: removed,
            warnings,
        })
    }

    /// Mark a dependency resolved. Resolving a resolved record changes
    /// nothing and writes no audit entry.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if the ID is unknown
    /// - `Error::InvalidInput` for an empty author
    pub async fn resolve(&mut self, id: &DependencyId, author: &str) -> Result<Mutation<Dependency>> {
        self.set_status(id, DependencyStatus::Resolved, author)
            .await
    }

    /// Return a resolved dependency to active. Reactivating an active
    /// record changes nothing and writes no audit entry.
    ///
    /// # Errors
    ///
    /// - `Error::DependencyNotFound` if the ID is unknown
    /// - `Error::InvalidInput` for an empty author
    pub async fn reactivate(
        &mut self,
        id: &DependencyId,
        author: &str,
    ) -> Result<Mutation<Dependency>> {
        self.set_status(id, DependencyStatus::Active, author).await
    }

    async fn set_status(
        &mut self,
        id: &DependencyId,
        status: DependencyStatus,
        author: &str,
    ) -> Result<Mutation<Dependency>> {
        require_non_empty("author", author)?;
        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::DependencyNotFound(id.clone()))?;
        if current.status == status {
            return Ok(Mutation::clean(current));
        }

        let dep = self
            .store
            .update_status(id, status, author, Utc::now())
            .await?;
        self.persist().await?;
        info!(id = %dep.id, %status, "Changed dependency status");

        let (event, verb) = match status {
            DependencyStatus::Resolved => (HistoryEvent::DependencyResolved, "resolved"),
            DependencyStatus::Active => (HistoryEvent::DependencyReactivated, "reactivated"),
        };
        let message = format!(
            "{verb} {} {} {}",
            dep.source_id, dep.dep_type, dep.target_id
        );
        let warnings = self.audit(event, &dep, message, author).await;
        Ok(Mutation {
            value: dep,
            warnings,
        })
    }

    async fn persist(&mut self) -> Result<()> {
        if let Err(err) = self.store.save().await {
            warn!(error = %err, "Save failed; reloading store");
            self.rollback().await;
            return Err(err);
        }
        Ok(())
    }

    async fn rollback(&mut self) {
        if let Err(err) = self.store.reload().await {
            warn!(error = %err, "Reload after failed write also failed");
        }
    }

    async fn audit(
        &self,
        event: HistoryEvent,
        dep: &Dependency,
        message: String,
        actor: &str,
    ) -> Vec<String> {
        let Some(log) = &self.history else {
            return Vec::new();
        };
        let entry = HistoryEntry {
            event,
            issue_id: dep.source_id.clone(),
            dependency_id: Some(dep.id.clone()),
            message,
            actor: actor.to_string(),
            timestamp: Utc::now(),
        };
        match log.record(entry).await {
            Ok(()) => Vec::new(),
            Err(err) => {
                warn!(id = %dep.id, %event, error = %err, "Failed to record history");
                vec![format!("history not recorded for {event} {}: {err}", dep.id)]
            }
        }
    }

    // ========== Queries ==========

    /// Every record touching `id`, including resolved ones.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn get_issue_dependencies(&self, id: &IssueId) -> Result<Vec<Dependency>> {
        self.store.list_by_issue(id).await
    }

    /// Serializable snapshot of the current graph.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn get_dependency_graph(&self) -> Result<GraphSnapshot> {
        Ok(self.build_graph().await?.snapshot())
    }

    /// Blocking status of one issue.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn get_blocking_info(&self, id: &IssueId) -> Result<BlockingInfo> {
        Ok(resolve_blocking(&self.build_graph().await?, id))
    }

    /// Cycles, conflicts and warnings for the whole graph.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn validate_dependency_graph(&self) -> Result<ValidationResult> {
        Ok(validate(&self.build_graph().await?, &self.options))
    }

    /// Downstream impact of changing `id`.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn analyze_dependency_impact(&self, id: &IssueId) -> Result<ImpactAnalysis> {
        let graph = self.build_graph().await?;
        Ok(analyze_impact(&graph, id, self.estimates.as_deref()))
    }

    /// Counts and rankings over the records `filter` accepts.
    ///
    /// # Errors
    ///
    /// Store errors, unchanged.
    pub async fn get_dependency_stats(&self, filter: &StatsFilter) -> Result<DependencyStats> {
        let records = self.store.list_all().await?;
        Ok(aggregate(&records, |dep| filter.matches(dep)))
    }

    /// Audit entries, oldest first; empty when no log is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        match &self.history {
            Some(log) => log.entries().await,
            None => Ok(Vec::new()),
        }
    }

    async fn build_graph(&self) -> Result<DependencyGraph> {
        let records = self.store.list_all().await?;
        Ok(DependencyGraph::build(&records))
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{what} cannot be empty")));
    }
    Ok(())
}
