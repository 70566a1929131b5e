//! Cycle and conflict detection over the whole graph.
//!
//! Validation never fails: malformed input beyond the record invariants is
//! simply reported. Issues referenced by a record are ordinary nodes whether
//! or not they still exist elsewhere.

use super::DependencyGraph;
use crate::domain::{
    ConflictKind, Dependency, DependencyConflict, DependencyType, IssueId, ValidationResult,
};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Blocking fan-out above which an advisory warning is emitted.
pub const DEFAULT_FAN_OUT_WARNING: usize = 5;

/// Knobs for [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Warn when an issue blocks more than this many issues
    pub fan_out_warning: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            fan_out_warning: DEFAULT_FAN_OUT_WARNING,
        }
    }
}

/// Validate the graph: cycles, conflicting pairs and advisory warnings.
///
/// `is_valid` is true iff there are no cycles and no conflicts.
#[must_use]
pub fn validate(graph: &DependencyGraph, options: &ValidationOptions) -> ValidationResult {
    let circular_paths = find_cycles(graph);
    let conflicting_deps = find_conflicts(graph.records());

    let mut warnings = fan_out_warnings(graph, options.fan_out_warning);
    warnings.extend(duplicate_edge_warnings(graph.records()));
    warnings.extend(mirrored_edge_warnings(graph.records()));
    warnings.extend(mutual_require_warnings(graph.records()));

    debug!(
        cycles = circular_paths.len(),
        conflicts = conflicting_deps.len(),
        warnings = warnings.len(),
        "Validated dependency graph"
    );

    ValidationResult {
        is_valid: circular_paths.is_empty() && conflicting_deps.is_empty(),
        circular_paths,
        conflicting_deps,
        warnings,
    }
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    cursor: usize,
}

/// Find cycles among active `Blocks` edges.
///
/// Depth-first search restarted from every unvisited node in ascending ID
/// order. A back edge to a node still on the stack yields the stack slice
/// from that node to the current one. Each cycle is rotated so its smallest
/// issue ID comes first; rotations of the same cycle are reported once.
///
/// Every pair blocking each other is reported as a length-2 cycle even when
/// the search reached it through a longer route first.
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<IssueId>> {
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut on_stack: HashSet<NodeIndex> = HashSet::new();
    let mut cycles: BTreeSet<Vec<IssueId>> = BTreeSet::new();

    for start in graph.inner().node_indices() {
        if !visited.insert(start) {
            continue;
        }
        on_stack.insert(start);
        let mut stack = vec![Frame {
            node: start,
            successors: graph.sorted_neighbors(start, Direction::Outgoing),
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(&next) = frame.successors.get(frame.cursor) {
                frame.cursor += 1;
                if on_stack.contains(&next) {
                    if let Some(pos) = stack.iter().position(|f| f.node == next) {
                        let cycle = stack[pos..]
                            .iter()
                            .map(|f| graph.issue(f.node).clone())
                            .collect();
                        cycles.insert(canonical_rotation(cycle));
                    }
                } else if visited.insert(next) {
                    on_stack.insert(next);
                    stack.push(Frame {
                        node: next,
                        successors: graph.sorted_neighbors(next, Direction::Outgoing),
                        cursor: 0,
                    });
                }
            } else {
                let node = frame.node;
                on_stack.remove(&node);
                stack.pop();
            }
        }
    }

    let inner = graph.inner();
    for edge in inner.edge_indices() {
        if let Some((from, to)) = inner.edge_endpoints(edge)
            && from != to
            && inner.find_edge(to, from).is_some()
        {
            cycles.insert(canonical_rotation(vec![
                graph.issue(from).clone(),
                graph.issue(to).clone(),
            ]));
        }
    }

    cycles.into_iter().collect()
}

fn canonical_rotation(mut cycle: Vec<IssueId>) -> Vec<IssueId> {
    if let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    {
        cycle.rotate_left(min_pos);
    }
    cycle
}

/// Active records grouped by unordered issue pair, smallest ID first.
fn records_by_pair(records: &[Dependency]) -> BTreeMap<(&IssueId, &IssueId), Vec<&Dependency>> {
    let mut pairs: BTreeMap<(&IssueId, &IssueId), Vec<&Dependency>> = BTreeMap::new();
    for dep in records.iter().filter(|dep| dep.is_active()) {
        let key = if dep.source_id <= dep.target_id {
            (&dep.source_id, &dep.target_id)
        } else {
            (&dep.target_id, &dep.source_id)
        };
        pairs.entry(key).or_default().push(dep);
    }
    for deps in pairs.values_mut() {
        deps.sort_by(|a, b| a.id.cmp(&b.id));
    }
    pairs
}

fn first_edge<'a>(
    deps: &[&'a Dependency],
    from: &IssueId,
    to: &IssueId,
    dep_type: DependencyType,
) -> Option<&'a Dependency> {
    deps.iter()
        .copied()
        .find(|d| d.dep_type == dep_type && &d.source_id == from && &d.target_id == to)
}

fn conflict(kind: ConflictKind, a: &Dependency, b: &Dependency) -> DependencyConflict {
    let (first, second) = if a.id <= b.id { (a, b) } else { (b, a) };
    DependencyConflict {
        kind,
        first: first.clone(),
        second: second.clone(),
    }
}

/// Contradictory pairs between the same two issues, one per pair per kind.
fn find_conflicts(records: &[Dependency]) -> Vec<DependencyConflict> {
    let mut conflicts = Vec::new();

    for ((lo, hi), deps) in records_by_pair(records) {
        let blocks_fwd = first_edge(&deps, lo, hi, DependencyType::Blocks);
        let blocks_rev = first_edge(&deps, hi, lo, DependencyType::Blocks);
        let requires_fwd = first_edge(&deps, lo, hi, DependencyType::Requires);
        let requires_rev = first_edge(&deps, hi, lo, DependencyType::Requires);

        if let (Some(a), Some(b)) = (blocks_fwd, blocks_rev) {
            conflicts.push(conflict(ConflictKind::MutualBlock, a, b));
        }
        let contradiction = blocks_fwd
            .zip(requires_fwd)
            .or_else(|| blocks_rev.zip(requires_rev));
        if let Some((a, b)) = contradiction {
            conflicts.push(conflict(ConflictKind::BlocksRequiresContradiction, a, b));
        }
    }

    conflicts
}

fn fan_out_warnings(graph: &DependencyGraph, threshold: usize) -> Vec<String> {
    graph
        .issue_ids()
        .filter_map(|id| {
            let count = graph.blocked_issues(id).len();
            (count > threshold).then(|| {
                format!("Issue {id} blocks {count} issues (more than {threshold}); consider splitting it")
            })
        })
        .collect()
}

fn duplicate_edge_warnings(records: &[Dependency]) -> Vec<String> {
    let mut groups: BTreeMap<(&IssueId, &IssueId, DependencyType), Vec<&Dependency>> =
        BTreeMap::new();
    for dep in records.iter().filter(|dep| dep.is_active()) {
        groups
            .entry((&dep.source_id, &dep.target_id, dep.dep_type))
            .or_default()
            .push(dep);
    }

    groups
        .into_iter()
        .filter(|(_, deps)| deps.len() > 1)
        .map(|((from, to, dep_type), mut deps)| {
            deps.sort_by(|a, b| a.id.cmp(&b.id));
            let ids: Vec<&str> = deps.iter().map(|d| d.id.as_str()).collect();
            format!(
                "Duplicate active {dep_type} dependency {from} -> {to} ({})",
                ids.join(", ")
            )
        })
        .collect()
}

fn mirrored_edge_warnings(records: &[Dependency]) -> Vec<String> {
    let mut warnings = Vec::new();
    for ((lo, hi), deps) in records_by_pair(records) {
        let mirrors = [
            (
                first_edge(&deps, lo, hi, DependencyType::Blocks),
                first_edge(&deps, hi, lo, DependencyType::Requires),
            ),
            (
                first_edge(&deps, hi, lo, DependencyType::Blocks),
                first_edge(&deps, lo, hi, DependencyType::Requires),
            ),
        ];
        for (blocks, requires) in mirrors {
            if let (Some(b), Some(r)) = (blocks, requires) {
                warnings.push(format!(
                    "Redundant dependencies: {} ({} blocks {}) and {} ({} requires {}) say the same thing",
                    b.id, b.source_id, b.target_id, r.id, r.source_id, r.target_id
                ));
            }
        }
    }
    warnings
}

// Requires edges stay out of the cycle graph, so a mutual pair is advisory.
fn mutual_require_warnings(records: &[Dependency]) -> Vec<String> {
    records_by_pair(records)
        .into_iter()
        .filter_map(|((lo, hi), deps)| {
            let fwd = first_edge(&deps, lo, hi, DependencyType::Requires)?;
            let rev = first_edge(&deps, hi, lo, DependencyType::Requires)?;
            Some(format!(
                "Issues {lo} and {hi} require each other ({}, {}); neither can complete first",
                fwd.id, rev.id
            ))
        })
        .collect()
}
