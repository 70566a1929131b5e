//! Property-based tests for the graph algorithms.
//!
//! Records are drawn over a small pool of issues so cycles, duplicates and
//! mirrored pairs turn up often.

use chrono::{TimeZone, Utc};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use proptest::prelude::*;

use skein::domain::{Dependency, DependencyId, DependencyType, IssueId, NewDependency};
use skein::graph::{
    DependencyGraph, ValidationOptions, aggregate, analyze_impact, find_cycles, resolve_blocking,
    validate,
};

const ISSUES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// Strategy for one record: (source, target, is_blocks, is_resolved).
fn edge() -> impl Strategy<Value = (usize, usize, bool, bool)> {
    (0..ISSUES.len(), 0..ISSUES.len(), any::<bool>(), any::<bool>())
        .prop_filter("no self-dependencies", |(from, to, _, _)| from != to)
}

fn records_from(edges: &[(usize, usize, bool, bool)]) -> Vec<Dependency> {
    edges
        .iter()
        .enumerate()
        .map(|(i, &(from, to, is_blocks, is_resolved))| {
            let created_at = Utc.timestamp_opt(1_767_225_600 + i as i64, 0).unwrap();
            let mut dep = NewDependency {
                source_id: IssueId::new(ISSUES[from]),
                target_id: IssueId::new(ISSUES[to]),
                dep_type: if is_blocks {
                    DependencyType::Blocks
                } else {
                    DependencyType::Requires
                },
                description: None,
                created_by: "prop".to_string(),
                created_at,
            }
            .into_dependency(DependencyId::new(format!("dep-{i:06}")));
            if is_resolved {
                dep.resolve("prop", created_at);
            }
            dep
        })
        .collect()
}

fn active_blocks(records: &[Dependency]) -> impl Iterator<Item = &Dependency> {
    records
        .iter()
        .filter(|d| d.is_active() && d.dep_type == DependencyType::Blocks)
}

proptest! {
    #[test]
    fn no_active_blocks_means_valid_and_unblocked(
        edges in prop::collection::vec(edge(), 0..20)
    ) {
        let mut records = records_from(&edges);
        for dep in &mut records {
            if dep.dep_type == DependencyType::Blocks {
                dep.resolve("prop", dep.created_at);
            }
        }
        let graph = DependencyGraph::build(&records);

        let result = validate(&graph, &ValidationOptions::default());
        prop_assert!(result.is_valid);
        for id in ISSUES {
            prop_assert!(!resolve_blocking(&graph, &IssueId::new(id)).is_blocked);
        }
    }

    #[test]
    fn cycles_found_iff_blocks_graph_is_cyclic(
        edges in prop::collection::vec(edge(), 0..20)
    ) {
        let records = records_from(&edges);
        let mut reference: DiGraphMap<&str, ()> = DiGraphMap::new();
        for dep in active_blocks(&records) {
            reference.add_edge(dep.source_id.as_str(), dep.target_id.as_str(), ());
        }

        let cycles = find_cycles(&DependencyGraph::build(&records));
        prop_assert_eq!(!cycles.is_empty(), is_cyclic_directed(&reference));

        for cycle in &cycles {
            prop_assert_eq!(cycle.iter().min(), cycle.first());
            for (i, from) in cycle.iter().enumerate() {
                let to = &cycle[(i + 1) % cycle.len()];
                prop_assert!(reference.contains_edge(from.as_str(), to.as_str()));
            }
        }
    }

    #[test]
    fn blocked_by_matches_active_blocks_edges(
        edges in prop::collection::vec(edge(), 0..20)
    ) {
        let records = records_from(&edges);
        let graph = DependencyGraph::build(&records);

        for id in ISSUES {
            let issue = IssueId::new(id);
            let info = resolve_blocking(&graph, &issue);

            let mut expected: Vec<IssueId> = active_blocks(&records)
                .filter(|d| d.target_id == issue)
                .map(|d| d.source_id.clone())
                .collect();
            expected.sort();
            expected.dedup();

            prop_assert_eq!(info.is_blocked, !expected.is_empty());
            prop_assert_eq!(info.blocked_by, expected);
            prop_assert_eq!(info.blocking_count, info.blocking.len());
        }
    }

    #[test]
    fn stats_totals_are_consistent(
        edges in prop::collection::vec(edge(), 0..20)
    ) {
        let records = records_from(&edges);
        let resolved = edges.iter().filter(|e| e.3).count();

        let stats = aggregate(&records, |_| true);

        prop_assert_eq!(stats.total_dependencies, records.len());
        prop_assert_eq!(stats.resolved_dependencies, resolved);
        prop_assert_eq!(stats.active_dependencies, records.len() - resolved);
        prop_assert_eq!(stats.by_type.values().sum::<usize>(), records.len());
        prop_assert_eq!(stats.created_by.get("prop").copied().unwrap_or(0), records.len());
    }

    #[test]
    fn impact_chains_start_at_origin_and_end_at_target(
        edges in prop::collection::vec(edge(), 0..20),
        origin in 0..ISSUES.len()
    ) {
        let records = records_from(&edges);
        let graph = DependencyGraph::build(&records);
        let origin = IssueId::new(ISSUES[origin]);

        let impact = analyze_impact(&graph, &origin, None);

        prop_assert!(!impact.affected_issues.contains(&origin));
        prop_assert_eq!(impact.blocking_chain.len(), impact.affected_issues.len());
        for (target, chain) in &impact.blocking_chain {
            prop_assert_eq!(chain.first(), Some(&origin));
            prop_assert_eq!(chain.last(), Some(target));
        }
        let longest = impact.blocking_chain.values().map(Vec::len).max().unwrap_or(0);
        prop_assert_eq!(impact.critical_path.len(), longest);
    }
}
