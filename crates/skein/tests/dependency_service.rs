//! Behavioural tests for `DependencyService` through the public API.

use skein::domain::{DependencyStatus, DependencyType, IssueId};
use skein::error::Error;
use skein::graph::StatsFilter;
use skein::service::DependencyService;
use skein::storage::{HistoryEvent, InMemoryHistoryLog, StorageBackend, create_store};

async fn service() -> DependencyService {
    let store = create_store(StorageBackend::InMemory).await.unwrap();
    DependencyService::new(store).with_history(InMemoryHistoryLog::new())
}

fn issue(id: &str) -> IssueId {
    IssueId::new(id)
}

async fn blocks(service: &mut DependencyService, from: &str, to: &str) -> skein::domain::Dependency {
    service
        .create(&issue(from), &issue(to), DependencyType::Blocks, None, "alice")
        .await
        .unwrap()
        .value
}

#[tokio::test]
async fn test_graph_without_active_blocks_is_valid_and_unblocked() {
    let mut service = service().await;
    service
        .create(&issue("a"), &issue("b"), DependencyType::Requires, None, "alice")
        .await
        .unwrap();
    let resolved = blocks(&mut service, "b", "c").await;
    service.resolve(&resolved.id, "alice").await.unwrap();

    let result = service.validate_dependency_graph().await.unwrap();
    assert!(result.is_valid);
    assert!(result.circular_paths.is_empty());

    for id in ["a", "b", "c"] {
        let info = service.get_blocking_info(&issue(id)).await.unwrap();
        assert!(!info.is_blocked, "{id} should not be blocked");
        assert!(info.blocked_by.is_empty());
    }
}

#[tokio::test]
async fn test_self_dependency_leaves_store_untouched() {
    let mut service = service().await;

    let err = service
        .create(&issue("a"), &issue("a"), DependencyType::Blocks, None, "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::SelfDependency(ref id) if id.as_str() == "a"));
    assert!(service.store().list_all().await.unwrap().is_empty());
    assert!(service.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mutual_block_is_one_cycle_and_one_conflict() {
    let mut service = service().await;
    blocks(&mut service, "b", "a").await;
    blocks(&mut service, "a", "b").await;

    let result = service.validate_dependency_graph().await.unwrap();

    assert!(!result.is_valid);
    assert_eq!(result.circular_paths, vec![vec![issue("a"), issue("b")]]);
    assert_eq!(result.conflicting_deps.len(), 1);
}

#[tokio::test]
async fn test_impact_along_a_chain() {
    let mut service = service().await;
    blocks(&mut service, "a", "b").await;
    blocks(&mut service, "b", "c").await;
    blocks(&mut service, "c", "d").await;

    let impact = service.analyze_dependency_impact(&issue("a")).await.unwrap();

    assert_eq!(impact.affected_issues, vec![issue("b"), issue("c"), issue("d")]);
    assert_eq!(
        impact.blocking_chain[&issue("d")],
        vec![issue("a"), issue("b"), issue("c"), issue("d")]
    );
    assert_eq!(impact.critical_path, impact.blocking_chain[&issue("d")]);
}

#[tokio::test]
async fn test_blocking_info_in_the_middle_of_a_chain() {
    let mut service = service().await;
    blocks(&mut service, "a", "b").await;
    blocks(&mut service, "b", "c").await;

    let middle = service.get_blocking_info(&issue("b")).await.unwrap();
    assert!(middle.is_blocked);
    assert_eq!(middle.blocked_by, vec![issue("a")]);
    assert_eq!(middle.blocking, vec![issue("c")]);
    assert!(middle.critical_path);

    let head = service.get_blocking_info(&issue("a")).await.unwrap();
    assert!(!head.is_blocked);
    assert!(!head.critical_path);
}

#[tokio::test]
async fn test_resolved_edges_leave_blocking_but_stay_listed() {
    let mut service = service().await;
    let dep = blocks(&mut service, "a", "b").await;
    service.resolve(&dep.id, "bob").await.unwrap();

    let info = service.get_blocking_info(&issue("b")).await.unwrap();
    assert!(info.blocked_by.is_empty());
    let info = service.get_blocking_info(&issue("a")).await.unwrap();
    assert!(info.blocking.is_empty());

    let listed = service.get_issue_dependencies(&issue("b")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, DependencyStatus::Resolved);
    assert_eq!(listed[0].resolved_by.as_deref(), Some("bob"));
}

#[tokio::test]
async fn test_resolve_twice_then_reactivate_restores_record() {
    let mut service = service().await;
    let original = blocks(&mut service, "a", "b").await;

    let first = service.resolve(&original.id, "bob").await.unwrap();
    let second = service.resolve(&original.id, "carol").await.unwrap();
    assert_eq!(first.value, second.value);

    let restored = service.reactivate(&original.id, "bob").await.unwrap();
    assert_eq!(restored.value, original);

    let events: Vec<HistoryEvent> = service
        .history()
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.event)
        .collect();
    assert_eq!(
        events,
        vec![
            HistoryEvent::DependencyCreated,
            HistoryEvent::DependencyResolved,
            HistoryEvent::DependencyReactivated,
        ]
    );
}

#[tokio::test]
async fn test_stats_totals_split_by_status() {
    let mut service = service().await;
    let mut created = Vec::new();
    for (from, to) in [("a", "b"), ("b", "c"), ("c", "d"), ("a", "e"), ("e", "f")] {
        created.push(blocks(&mut service, from, to).await);
    }
    for dep in &created[..2] {
        service.resolve(&dep.id, "alice").await.unwrap();
    }

    let stats = service
        .get_dependency_stats(&StatsFilter::default())
        .await
        .unwrap();

    assert_eq!(stats.total_dependencies, 5);
    assert_eq!(stats.active_dependencies, 3);
    assert_eq!(stats.resolved_dependencies, 2);
    assert_eq!(stats.by_status[&DependencyStatus::Active], 3);
    assert_eq!(stats.by_status[&DependencyStatus::Resolved], 2);
}

#[tokio::test]
async fn test_remove_between_covers_both_directions() {
    let mut service = service().await;
    blocks(&mut service, "a", "b").await;
    service
        .create(&issue("b"), &issue("a"), DependencyType::Requires, None, "alice")
        .await
        .unwrap();
    blocks(&mut service, "a", "c").await;

    let removed = service
        .remove_between(&issue("b"), &issue("a"), "alice")
        .await
        .unwrap();
    assert_eq!(removed.value.len(), 2);

    let left = service.store().list_all().await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].target_id, issue("c"));

    let err = service
        .remove_between(&issue("a"), &issue("b"), "alice")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_from_str_rejects_unknown_type() {
    let mut service = service().await;

    let err = service
        .create_from_str(&issue("a"), &issue("b"), "relates-to", None, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDependencyType(_)));

    let created = service
        .create_from_str(&issue("a"), &issue("b"), "Requires", Some("  schema  ".into()), "alice")
        .await
        .unwrap();
    assert_eq!(created.value.dep_type, DependencyType::Requires);
    assert_eq!(created.value.description.as_deref(), Some("schema"));
}
