//! Dependency graph built on demand from the flat record list.
//!
//! The record list is the system of record; [`DependencyGraph`] is a derived
//! view that lives for one query. Adjacency uses petgraph's `DiGraph` with an
//! `IssueId -> NodeIndex` map.
//!
//! ## Edge Direction Convention
//!
//! Only active `Blocks` records become edges, and they keep their stored
//! direction: `Blocks(A, B)` is the edge `A -> B`, read as "A must finish
//! before B". Successors of a node are the issues it blocks; predecessors
//! are the issues blocking it.
//!
//! Active `Requires` records are kept in a separate list. They feed
//! validation and statistics but are never traversed by the blocking and
//! impact algorithms.
//!
//! Nodes are inserted in ascending issue ID order, so sorting `NodeIndex`
//! values sorts the matching issue IDs. The algorithms rely on this for
//! deterministic traversal.

pub mod blocking;
pub mod impact;
pub mod stats;
pub mod validate;

pub use blocking::resolve_blocking;
pub use impact::analyze_impact;
pub use stats::{StatsFilter, aggregate};
pub use validate::{DEFAULT_FAN_OUT_WARNING, ValidationOptions, find_cycles, validate};

use crate::domain::{Dependency, DependencyId, DependencyStatus, DependencyType, IssueId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Ephemeral directed view over a set of dependency records.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Every record the graph was built from, in input order
    records: Vec<Dependency>,

    /// Active `Blocks` adjacency; edge weights are the record IDs
    graph: DiGraph<IssueId, DependencyId>,

    /// Mapping from issue to graph node
    node_map: HashMap<IssueId, NodeIndex>,

    /// Active `Requires` records, not part of `graph`
    requires: Vec<Dependency>,
}

impl DependencyGraph {
    /// Build the graph from a record slice. Pure; an empty slice yields an
    /// empty graph.
    #[must_use]
    pub fn build(records: &[Dependency]) -> Self {
        let issue_ids: BTreeSet<&IssueId> = records
            .iter()
            .flat_map(|dep| [&dep.source_id, &dep.target_id])
            .collect();

        let mut graph = DiGraph::with_capacity(issue_ids.len(), records.len());
        let mut node_map = HashMap::with_capacity(issue_ids.len());
        for id in issue_ids {
            let node = graph.add_node(id.clone());
            node_map.insert(id.clone(), node);
        }

        let mut requires = Vec::new();
        for dep in records.iter().filter(|dep| dep.is_active()) {
            match dep.dep_type {
                DependencyType::Blocks => {
                    let from = node_map[&dep.source_id];
                    let to = node_map[&dep.target_id];
                    graph.add_edge(from, to, dep.id.clone());
                }
                DependencyType::Requires => requires.push(dep.clone()),
            }
        }

        debug!(
            records = records.len(),
            issues = graph.node_count(),
            blocks_edges = graph.edge_count(),
            requires_edges = requires.len(),
            "Built dependency graph"
        );

        Self {
            records: records.to_vec(),
            graph,
            node_map,
            requires,
        }
    }

    /// Whether the graph has no records at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `id` appears in any record.
    #[must_use]
    pub fn contains(&self, id: &IssueId) -> bool {
        self.node_map.contains_key(id)
    }

    /// All issue IDs appearing in any record, ascending.
    pub fn issue_ids(&self) -> impl Iterator<Item = &IssueId> {
        self.graph.node_weights()
    }

    /// The records the graph was built from.
    #[must_use]
    pub fn records(&self) -> &[Dependency] {
        &self.records
    }

    /// Active `Requires` records.
    #[must_use]
    pub fn requires_edges(&self) -> &[Dependency] {
        &self.requires
    }

    /// Active `Blocks` records.
    pub fn blocks_edges(&self) -> impl Iterator<Item = &Dependency> {
        self.records
            .iter()
            .filter(|dep| dep.is_active() && dep.dep_type == DependencyType::Blocks)
    }

    /// Issues that `id` blocks, ascending and deduplicated.
    #[must_use]
    pub fn blocked_issues(&self, id: &IssueId) -> Vec<IssueId> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Issues that block `id`, ascending and deduplicated.
    #[must_use]
    pub fn blocking_issues(&self, id: &IssueId) -> Vec<IssueId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Serializable view of the active edges.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut adjacency = BTreeMap::new();
        for id in self.issue_ids() {
            let blocked = self.blocked_issues(id);
            if !blocked.is_empty() {
                adjacency.insert(id.clone(), blocked);
            }
        }

        let mut edges: Vec<GraphEdge> = self
            .records
            .iter()
            .filter(|dep| dep.is_active())
            .map(GraphEdge::from)
            .collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));

        GraphSnapshot {
            issues: self.issue_ids().cloned().collect(),
            edges,
            adjacency,
            resolved_count: self
                .records
                .iter()
                .filter(|dep| dep.status == DependencyStatus::Resolved)
                .count(),
        }
    }

    pub(crate) fn node(&self, id: &IssueId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub(crate) fn issue(&self, node: NodeIndex) -> &IssueId {
        &self.graph[node]
    }

    pub(crate) fn inner(&self) -> &DiGraph<IssueId, DependencyId> {
        &self.graph
    }

    /// Neighbour nodes in one direction, ascending by issue ID, without repeats.
    pub(crate) fn sorted_neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(node, direction).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    fn neighbors(&self, id: &IssueId, direction: Direction) -> Vec<IssueId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        self.sorted_neighbors(node, direction)
            .into_iter()
            .map(|n| self.graph[n].clone())
            .collect()
    }
}

/// One active edge in a [`GraphSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Record ID
    pub id: DependencyId,
    /// Source issue
    pub source_id: IssueId,
    /// Target issue
    pub target_id: IssueId,
    /// Relationship kind
    pub dep_type: DependencyType,
}

impl From<&Dependency> for GraphEdge {
    fn from(dep: &Dependency) -> Self {
        Self {
            id: dep.id.clone(),
            source_id: dep.source_id.clone(),
            target_id: dep.target_id.clone(),
            dep_type: dep.dep_type,
        }
    }
}

/// Serializable picture of the graph at query time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSnapshot {
    /// Every issue appearing in any record, ascending
    pub issues: Vec<IssueId>,
    /// Active edges of both types, by record ID
    pub edges: Vec<GraphEdge>,
    /// Blocks adjacency: issue -> issues it blocks
    pub adjacency: BTreeMap<IssueId, Vec<IssueId>>,
    /// Number of resolved records left out of `edges`
    pub resolved_count: usize,
}
