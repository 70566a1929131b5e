//! Integration tests for resilient loading and atomic rewriting on disk.

use rstest::rstest;
use serde::{Deserialize, Serialize};
use skein_jsonl::{Warning, append_jsonl, read_jsonl_resilient, write_jsonl_atomic};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Edge {
    id: String,
    from: String,
    to: String,
}

fn edge(id: &str, from: &str, to: &str) -> Edge {
    Edge {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[tokio::test]
async fn test_atomic_write_then_resilient_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edges.jsonl");
    let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];

    write_jsonl_atomic(&path, &edges).await.unwrap();
    let (loaded, warnings) = read_jsonl_resilient::<Edge, _>(&path).await.unwrap();

    assert_eq!(loaded, edges);
    assert!(warnings.is_empty());
}

#[rstest]
#[case::truncated_object("{\"id\":\"e9\",\"from\":")]
#[case::wrong_shape("[1, 2, 3]")]
#[case::missing_field("{\"id\":\"e9\"}")]
#[tokio::test]
async fn test_corrupted_line_is_reported_and_skipped(#[case] corrupted: &str) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edges.jsonl");

    let first = serde_json::to_string(&edge("e1", "a", "b")).unwrap();
    tokio::fs::write(&path, format!("{first}\n{corrupted}\n"))
        .await
        .unwrap();
    append_jsonl(&path, &edge("e2", "b", "c")).await.unwrap();

    let (loaded, warnings) = read_jsonl_resilient::<Edge, _>(&path).await.unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        warnings[0],
        Warning::MalformedJson { line_number: 2, .. }
    ));
}

#[tokio::test]
async fn test_missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = read_jsonl_resilient::<Edge, _>(dir.path().join("absent.jsonl")).await;

    match result {
        Err(skein_jsonl::Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected NotFound io error, got {other:?}"),
    }
}
