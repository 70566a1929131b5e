//! Result types produced by the graph algorithms.
//!
//! All of these are plain data: the algorithms in [`crate::graph`] build
//! them, and the presentation layer serializes or renders them.

use super::{Dependency, DependencyStatus, DependencyType, IssueId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Blocking status of a single issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockingInfo {
    /// The issue this information is about
    pub issue_id: IssueId,

    /// At least one active `Blocks` edge points at this issue
    pub is_blocked: bool,

    /// Issues with an active `Blocks` edge into this one, ascending
    pub blocked_by: Vec<IssueId>,

    /// Number of issues this one blocks
    pub blocking_count: usize,

    /// Issues this one blocks, ascending
    pub blocking: Vec<IssueId>,

    /// Local bottleneck heuristic: blocked and blocking at the same time.
    ///
    /// Not the same as [`ImpactAnalysis::critical_path`], which is the
    /// longest chain found from an origin.
    pub critical_path: bool,
}

/// How two dependencies between the same pair of issues contradict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// `Blocks(A, B)` and `Blocks(B, A)`
    MutualBlock,

    /// `Blocks(A, B)` and `Requires(A, B)`
    BlocksRequiresContradiction,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MutualBlock => f.write_str("mutual block"),
            Self::BlocksRequiresContradiction => f.write_str("blocks/requires contradiction"),
        }
    }
}

/// A pair of active dependencies whose intent cannot both hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyConflict {
    /// Kind of contradiction
    pub kind: ConflictKind,

    /// First record of the pair (smaller ID)
    pub first: Dependency,

    /// Second record of the pair
    pub second: Dependency,
}

/// Outcome of validating the whole dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// No cycles and no conflicts
    pub is_valid: bool,

    /// Each cycle, rotated so its smallest issue ID comes first
    pub circular_paths: Vec<Vec<IssueId>>,

    /// Contradictory dependency pairs
    pub conflicting_deps: Vec<DependencyConflict>,

    /// Advisory notes; never affect `is_valid`
    pub warnings: Vec<String>,
}

/// Categorical risk of changing an issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Nothing downstream
    #[default]
    None,
    /// One or two issues affected
    Low,
    /// Three to five issues affected
    Medium,
    /// More than five affected, or the origin sits on a cycle
    High,
}

impl RiskLevel {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Projected effect of changing one issue on everything downstream of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactAnalysis {
    /// The issue being changed
    pub origin: IssueId,

    /// Risk category
    pub risk_level: RiskLevel,

    /// Every issue transitively blocked by the origin, in discovery order
    pub affected_issues: Vec<IssueId>,

    /// Shortest path from the origin to each affected issue, both ends included
    pub blocking_chain: BTreeMap<IssueId, Vec<IssueId>>,

    /// Longest chain among `blocking_chain`; empty when nothing is affected
    pub critical_path: Vec<IssueId>,

    /// Summed estimated hours along the critical path, when fully known
    pub delay_estimate_hours: Option<f64>,

    /// Advisory text
    pub recommendations: Vec<String>,
}

/// An issue together with an edge count, used in rankings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedIssue {
    /// The ranked issue
    pub issue_id: IssueId,

    /// Number of active `Blocks` edges counted for the ranking
    pub count: usize,
}

/// Graph-wide counts and rankings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DependencyStats {
    /// All records that passed the filter
    pub total_dependencies: usize,
    /// Records in the active state
    pub active_dependencies: usize,
    /// Records in the resolved state
    pub resolved_dependencies: usize,
    /// Distinct issues appearing at either end of a record
    pub issues_with_dependencies: usize,
    /// `total_dependencies / issues_with_dependencies`, 0.0 when empty
    pub average_dependencies_per_issue: f64,
    /// Distinct cycles among active `Blocks` edges
    pub circular_dependencies: usize,
    /// Record count per type
    pub by_type: BTreeMap<DependencyType, usize>,
    /// Record count per status
    pub by_status: BTreeMap<DependencyStatus, usize>,
    /// Issues with the most inbound active `Blocks` edges
    pub most_blocked: Vec<RankedIssue>,
    /// Issues with the most outbound active `Blocks` edges
    pub most_blocking: Vec<RankedIssue>,
    /// Records created per author
    pub created_by: BTreeMap<String, usize>,
}
