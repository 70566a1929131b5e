//! Blocking status for a single issue.

use super::DependencyGraph;
use crate::domain::{BlockingInfo, IssueId};

/// Compute who blocks `id` and whom it blocks, over active `Blocks` edges.
///
/// An issue the graph has never seen gets the zero value, not an error.
#[must_use]
pub fn resolve_blocking(graph: &DependencyGraph, id: &IssueId) -> BlockingInfo {
    let blocked_by = graph.blocking_issues(id);
    let blocking = graph.blocked_issues(id);
    let is_blocked = !blocked_by.is_empty();

    BlockingInfo {
        issue_id: id.clone(),
        is_blocked,
        blocking_count: blocking.len(),
        // Bottleneck: waiting on something while others wait on it.
        critical_path: is_blocked && !blocking.is_empty(),
        blocked_by,
        blocking,
    }
}
