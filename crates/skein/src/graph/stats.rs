//! Graph-wide counts and rankings.

use super::{DependencyGraph, find_cycles};
use crate::domain::{Dependency, DependencyStats, DependencyType, IssueId, RankedIssue};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Length of the most-blocked and most-blocking rankings.
pub const RANKING_SIZE: usize = 10;

/// Ready-made record predicate for [`aggregate`].
///
/// Unset fields match everything; time bounds are inclusive and apply to
/// `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsFilter {
    /// Only records created by this actor
    pub author: Option<String>,
    /// Only records created at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Only records created at or before this instant
    pub until: Option<DateTime<Utc>>,
}

impl StatsFilter {
    /// Whether `dep` passes the filter.
    #[must_use]
    pub fn matches(&self, dep: &Dependency) -> bool {
        self.author.as_ref().is_none_or(|a| &dep.created_by == a)
            && self.since.is_none_or(|since| dep.created_at >= since)
            && self.until.is_none_or(|until| dep.created_at <= until)
    }
}

/// Aggregate statistics over the records accepted by `predicate`.
pub fn aggregate<F>(records: &[Dependency], predicate: F) -> DependencyStats
where
    F: Fn(&Dependency) -> bool,
{
    let selected: Vec<Dependency> = records.iter().filter(|d| predicate(d)).cloned().collect();

    let mut stats = DependencyStats {
        total_dependencies: selected.len(),
        ..DependencyStats::default()
    };

    let mut issues: BTreeSet<&IssueId> = BTreeSet::new();
    let mut inbound: BTreeMap<&IssueId, usize> = BTreeMap::new();
    let mut outbound: BTreeMap<&IssueId, usize> = BTreeMap::new();

    for dep in &selected {
        issues.insert(&dep.source_id);
        issues.insert(&dep.target_id);

        *stats.by_type.entry(dep.dep_type).or_default() += 1;
        *stats.by_status.entry(dep.status).or_default() += 1;
        *stats.created_by.entry(dep.created_by.clone()).or_default() += 1;

        if dep.is_active() {
            stats.active_dependencies += 1;
            if dep.dep_type == DependencyType::Blocks {
                *inbound.entry(&dep.target_id).or_default() += 1;
                *outbound.entry(&dep.source_id).or_default() += 1;
            }
        } else {
            stats.resolved_dependencies += 1;
        }
    }

    stats.issues_with_dependencies = issues.len();
    if !issues.is_empty() {
        #[allow(clippy::cast_precision_loss)]
        let average = stats.total_dependencies as f64 / issues.len() as f64;
        stats.average_dependencies_per_issue = average;
    }
    stats.most_blocked = top_ranked(inbound);
    stats.most_blocking = top_ranked(outbound);
    stats.circular_dependencies = find_cycles(&DependencyGraph::build(&selected)).len();

    stats
}

/// Highest counts first, ties by issue ID ascending.
fn top_ranked(counts: BTreeMap<&IssueId, usize>) -> Vec<RankedIssue> {
    let mut ranked: Vec<RankedIssue> = counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(id, count)| RankedIssue {
            issue_id: id.clone(),
            count,
        })
        .collect();
    // Stable sort keeps the map's ascending ID order among equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(RANKING_SIZE);
    ranked
}
