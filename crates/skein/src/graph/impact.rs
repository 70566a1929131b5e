//! Impact of changing one issue on everything downstream of it.
//!
//! Downstream means reachable over active `Blocks` edges. The traversal is a
//! breadth-first search visiting neighbours in ascending ID order, so every
//! affected issue gets its shortest chain from the origin and the output is
//! deterministic.

use super::DependencyGraph;
use crate::domain::{ImpactAnalysis, IssueId, RiskLevel};
use crate::storage::EstimateSource;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Affected-issue count above which risk is high.
const MEDIUM_RISK_MAX: usize = 5;

/// Affected-issue count above which risk is at least medium.
const LOW_RISK_MAX: usize = 2;

/// Project the effect of changing `origin`.
///
/// The origin itself is never reported as affected, even when it sits on a
/// cycle. When `estimates` is given and every issue on the critical path
/// after the origin has an estimate, their sum becomes the delay estimate.
#[must_use]
pub fn analyze_impact(
    graph: &DependencyGraph,
    origin: &IssueId,
    estimates: Option<&dyn EstimateSource>,
) -> ImpactAnalysis {
    let Some(origin_node) = graph.node(origin) else {
        return ImpactAnalysis {
            origin: origin.clone(),
            recommendations: vec![no_impact_note(origin)],
            ..ImpactAnalysis::default()
        };
    };

    let (affected, chains) = shortest_chains(graph, origin_node);
    let affected_issues: Vec<IssueId> = affected.iter().map(|&n| graph.issue(n).clone()).collect();
    let blocking_chain: BTreeMap<IssueId, Vec<IssueId>> = affected
        .iter()
        .map(|n| (graph.issue(*n).clone(), chains[n].clone()))
        .collect();

    // Ascending terminal ID order, so the first longest chain wins ties.
    let critical_path = blocking_chain
        .values()
        .fold(None::<&Vec<IssueId>>, |best, chain| match best {
            Some(b) if b.len() >= chain.len() => Some(b),
            _ => Some(chain),
        })
        .cloned()
        .unwrap_or_default();

    let on_cycle = graph
        .sorted_neighbors(origin_node, Direction::Outgoing)
        .into_iter()
        .any(|succ| has_path_connecting(graph.inner(), succ, origin_node, None));

    let risk_level = risk_for(affected_issues.len(), on_cycle);

    let delay_estimate_hours = match (estimates, critical_path.split_first()) {
        (Some(source), Some((_, downstream))) if !downstream.is_empty() => downstream
            .iter()
            .map(|id| source.estimated_hours(id))
            .sum::<Option<f64>>(),
        _ => None,
    };

    let mut recommendations = Vec::new();
    if on_cycle {
        recommendations.push(format!(
            "Issue {origin} is part of a dependency cycle; break the cycle before scheduling this work"
        ));
    }
    for pair in critical_path.windows(2) {
        recommendations.push(format!("Resolve {} before {}", pair[0], pair[1]));
    }
    let chains_count = independent_chains(graph, origin_node);
    if chains_count > 1 {
        recommendations.push(format!(
            "Parallelize: {chains_count} independent chains can proceed once {origin} is done"
        ));
    }
    match risk_level {
        RiskLevel::High => recommendations.push(format!(
            "High risk: coordinate with the owners of all {} affected issues before changing {origin}",
            affected_issues.len()
        )),
        RiskLevel::None => recommendations.push(no_impact_note(origin)),
        RiskLevel::Low | RiskLevel::Medium => {}
    }

    ImpactAnalysis {
        origin: origin.clone(),
        risk_level,
        affected_issues,
        blocking_chain,
        critical_path,
        delay_estimate_hours,
        recommendations,
    }
}

fn no_impact_note(origin: &IssueId) -> String {
    format!("No downstream impact: nothing is blocked by {origin}")
}

fn risk_for(affected: usize, on_cycle: bool) -> RiskLevel {
    match affected {
        _ if on_cycle => RiskLevel::High,
        0 => RiskLevel::None,
        n if n <= LOW_RISK_MAX => RiskLevel::Low,
        n if n <= MEDIUM_RISK_MAX => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

/// BFS from `origin`; returns discovery order and each node's chain,
/// origin included at the head.
fn shortest_chains(
    graph: &DependencyGraph,
    origin: NodeIndex,
) -> (Vec<NodeIndex>, HashMap<NodeIndex, Vec<IssueId>>) {
    let mut order = Vec::new();
    let mut chains: HashMap<NodeIndex, Vec<IssueId>> = HashMap::new();
    chains.insert(origin, vec![graph.issue(origin).clone()]);

    let mut queue = VecDeque::from([origin]);
    while let Some(node) = queue.pop_front() {
        for next in graph.sorted_neighbors(node, Direction::Outgoing) {
            if chains.contains_key(&next) {
                continue;
            }
            let mut chain = chains[&node].clone();
            chain.push(graph.issue(next).clone());
            chains.insert(next, chain);
            order.push(next);
            queue.push_back(next);
        }
    }

    chains.remove(&origin);
    (order, chains)
}

/// Number of disjoint downstream groups hanging off the origin's direct
/// successors. Two successors share a group when their downstream sets meet.
fn independent_chains(graph: &DependencyGraph, origin: NodeIndex) -> usize {
    let mut groups: Vec<HashSet<NodeIndex>> = Vec::new();

    for succ in graph.sorted_neighbors(origin, Direction::Outgoing) {
        let mut reach = HashSet::from([succ]);
        let mut queue = VecDeque::from([succ]);
        while let Some(node) = queue.pop_front() {
            for next in graph.sorted_neighbors(node, Direction::Outgoing) {
                if next != origin && reach.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        let (overlapping, mut rest): (Vec<_>, Vec<_>) =
            groups.into_iter().partition(|g| !g.is_disjoint(&reach));
        for group in overlapping {
            reach.extend(group);
        }
        rest.push(reach);
        groups = rest;
    }

    groups.len()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::Dependency;
    use rstest::rstest;
    use std::collections::HashMap as Map;

    fn analyze(records: &[Dependency], origin: &str) -> ImpactAnalysis {
        analyze_impact(&DependencyGraph::build(records), &IssueId::new(origin), None)
    }

    fn linear_chain() -> Vec<Dependency> {
        vec![
            blocks("d1", "a", "b"),
            blocks("d2", "b", "c"),
            blocks("d3", "c", "d"),
        ]
    }

    #[test]
    fn test_linear_chain_impact() {
        let impact = analyze(&linear_chain(), "a");

        assert_eq!(impact.affected_issues, ids(&["b", "c", "d"]));
        assert_eq!(
            impact.blocking_chain[&IssueId::new("d")],
            ids(&["a", "b", "c", "d"])
        );
        assert_eq!(impact.blocking_chain[&IssueId::new("b")], ids(&["a", "b"]));
        assert_eq!(impact.critical_path, ids(&["a", "b", "c", "d"]));
        assert_eq!(impact.risk_level, RiskLevel::Medium);
        assert!(impact
            .recommendations
            .contains(&"Resolve a before b".to_string()));
    }

    #[test]
    fn test_leaf_has_no_impact() {
        let impact = analyze(&linear_chain(), "d");
        assert_eq!(impact.risk_level, RiskLevel::None);
        assert!(impact.affected_issues.is_empty());
        assert!(impact.critical_path.is_empty());
        assert_eq!(impact.recommendations.len(), 1);
        assert!(impact.recommendations[0].starts_with("No downstream impact"));
    }

    #[test]
    fn test_unknown_origin_has_no_impact() {
        let impact = analyze(&linear_chain(), "zzz");
        assert_eq!(impact.origin, IssueId::new("zzz"));
        assert_eq!(impact.risk_level, RiskLevel::None);
    }

    #[test]
    fn test_shortest_chain_wins_over_longer_route() {
        let impact = analyze(
            &[
                blocks("d1", "a", "b"),
                blocks("d2", "b", "c"),
                blocks("d3", "a", "c"),
            ],
            "a",
        );
        assert_eq!(impact.blocking_chain[&IssueId::new("c")], ids(&["a", "c"]));
    }

    #[test]
    fn test_critical_path_tie_breaks_on_smallest_terminal() {
        let impact = analyze(
            &[
                blocks("d1", "o", "p"),
                blocks("d2", "p", "z"),
                blocks("d3", "o", "q"),
                blocks("d4", "q", "m"),
            ],
            "o",
        );
        assert_eq!(impact.critical_path, ids(&["o", "q", "m"]));
    }

    #[rstest]
    #[case(1, RiskLevel::Low)]
    #[case(2, RiskLevel::Low)]
    #[case(3, RiskLevel::Medium)]
    #[case(5, RiskLevel::Medium)]
    #[case(6, RiskLevel::High)]
    fn test_risk_levels_by_fan_out(#[case] fan_out: usize, #[case] expected: RiskLevel) {
        let records: Vec<Dependency> = (0..fan_out)
            .map(|i| blocks(&format!("d{i}"), "root", &format!("leaf-{i}")))
            .collect();
        assert_eq!(analyze(&records, "root").risk_level, expected);
    }

    #[test]
    fn test_origin_on_cycle_is_high_risk_and_not_affected() {
        let impact = analyze(&[blocks("d1", "a", "b"), blocks("d2", "b", "a")], "a");
        assert_eq!(impact.risk_level, RiskLevel::High);
        assert_eq!(impact.affected_issues, ids(&["b"]));
        assert!(impact.recommendations[0].contains("cycle"));
    }

    #[test]
    fn test_parallel_chains_are_counted() {
        let impact = analyze(
            &[
                blocks("d1", "a", "b"),
                blocks("d2", "a", "c"),
                blocks("d3", "b", "d"),
                blocks("d4", "a", "e"),
                blocks("d5", "e", "d"),
            ],
            "a",
        );
        // b and e meet at d; c stands alone.
        assert!(impact
            .recommendations
            .iter()
            .any(|r| r.starts_with("Parallelize: 2 independent chains")));
    }

    struct Hours(Map<IssueId, f64>);

    impl EstimateSource for Hours {
        fn estimated_hours(&self, issue: &IssueId) -> Option<f64> {
            self.0.get(issue).copied()
        }
    }

    #[test]
    fn test_delay_estimate_sums_critical_path_after_origin() {
        let hours = Hours(Map::from([
            (IssueId::new("a"), 100.0),
            (IssueId::new("b"), 2.0),
            (IssueId::new("c"), 3.5),
            (IssueId::new("d"), 1.0),
        ]));
        let graph = DependencyGraph::build(&linear_chain());
        let impact = analyze_impact(&graph, &IssueId::new("a"), Some(&hours));
        assert_eq!(impact.delay_estimate_hours, Some(6.5));
    }

    #[test]
    fn test_delay_estimate_absent_when_any_member_unknown() {
        let hours = Hours(Map::from([(IssueId::new("b"), 2.0)]));
        let graph = DependencyGraph::build(&linear_chain());
        let impact = analyze_impact(&graph, &IssueId::new("a"), Some(&hours));
        assert_eq!(impact.delay_estimate_hours, None);
    }
}
