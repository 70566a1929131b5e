//! Domain types for dependency tracking.
//!
//! A [`Dependency`] is a directed, typed edge between two issues. Issues are
//! referenced only by [`IssueId`]; this crate never looks inside an issue
//! record.

mod analysis;

pub use analysis::{
    BlockingInfo, ConflictKind, DependencyConflict, DependencyStats, ImpactAnalysis, RankedIssue,
    RiskLevel, ValidationResult,
};

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a dependency description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Identifier of an issue, opaque to this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub String);

impl IssueId {
    /// Create a new issue ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for IssueId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IssueId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a dependency record (e.g. `dep-4k2x9a`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(pub String);

impl DependencyId {
    /// Create a new dependency ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DependencyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of relationship a dependency expresses.
///
/// `Requires(A, B)` says the same thing as `Blocks(B, A)`, but the two are
/// stored as written. Graph code must read direction per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Source must complete before target can proceed
    Blocks,

    /// Source cannot complete until target completes
    Requires,
}

impl DependencyType {
    /// Lowercase wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Requires => "requires",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "blocks" => Ok(Self::Blocks),
            "requires" => Ok(Self::Requires),
            _ => Err(Error::InvalidDependencyType(s.to_string())),
        }
    }
}

/// Lifecycle state of a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    /// Participates in blocking and cycle computations
    Active,

    /// Kept for history only
    Resolved,
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// Input for creating a dependency; the store assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDependency {
    /// Issue the edge starts from
    pub source_id: IssueId,
    /// Issue the edge points to
    pub target_id: IssueId,
    /// Relationship kind
    pub dep_type: DependencyType,
    /// Free-form description
    pub description: Option<String>,
    /// Who is creating the dependency
    pub created_by: String,
    /// Creation instant
    pub created_at: DateTime<Utc>,
}

impl NewDependency {
    /// Turn the input into an active record with the given ID.
    #[must_use]
    pub fn into_dependency(self, id: DependencyId) -> Dependency {
        Dependency {
            id,
            source_id: self.source_id,
            target_id: self.target_id,
            dep_type: self.dep_type,
            status: DependencyStatus::Active,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            resolved_by: None,
            resolved_at: None,
        }
    }
}

/// A directed, typed edge between two issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Unique identifier, generated at creation
    pub id: DependencyId,

    /// Issue the edge starts from
    pub source_id: IssueId,

    /// Issue the edge points to
    pub target_id: IssueId,

    /// Relationship kind
    pub dep_type: DependencyType,

    /// Current lifecycle state
    pub status: DependencyStatus,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Who created the dependency
    pub created_by: String,

    /// When the dependency was created
    pub created_at: DateTime<Utc>,

    /// Who resolved it (set only while resolved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,

    /// When it was resolved (set only while resolved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dependency {
    /// Whether the edge takes part in graph algorithms.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == DependencyStatus::Active
    }

    /// Whether `id` is either end of the edge.
    #[must_use]
    pub fn involves(&self, id: &IssueId) -> bool {
        &self.source_id == id || &self.target_id == id
    }

    /// Whether the edge connects `a` and `b` in either direction.
    #[must_use]
    pub fn connects(&self, a: &IssueId, b: &IssueId) -> bool {
        (&self.source_id == a && &self.target_id == b)
            || (&self.source_id == b && &self.target_id == a)
    }

    /// Mark the dependency resolved.
    pub fn resolve(&mut self, actor: impl Into<String>, at: DateTime<Utc>) {
        self.status = DependencyStatus::Resolved;
        self.resolved_by = Some(actor.into());
        self.resolved_at = Some(at);
    }

    /// Return the dependency to the active state, clearing resolution fields.
    pub fn reactivate(&mut self) {
        self.status = DependencyStatus::Active;
        self.resolved_by = None;
        self.resolved_at = None;
    }

    /// Check the record-level invariants.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("Dependency ID cannot be empty".to_string());
        }
        if self.source_id.as_str().trim().is_empty() || self.target_id.as_str().trim().is_empty()
        {
            return Err("Issue IDs cannot be empty".to_string());
        }
        if self.source_id == self.target_id {
            return Err(format!("Issue {} cannot depend on itself", self.source_id));
        }
        if let Some(description) = &self.description {
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(format!(
                    "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters"
                ));
            }
        }

        let has_resolution = self.resolved_by.is_some() || self.resolved_at.is_some();
        let fully_resolved = self.resolved_by.is_some() && self.resolved_at.is_some();
        match self.status {
            DependencyStatus::Active if has_resolution => {
                Err("Active dependency cannot carry resolution fields".to_string())
            }
            DependencyStatus::Resolved if !fully_resolved => {
                Err("Resolved dependency must record who resolved it and when".to_string())
            }
            _ => Ok(()),
        }
    }
}
