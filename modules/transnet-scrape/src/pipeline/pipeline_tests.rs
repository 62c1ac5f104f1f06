//! End-to-end pipeline tests against the in-memory store and mock
//! source: resumability, idempotence, monotonic tagging, phase skipping,
//! and continue-past-item-failure behavior.

use std::collections::BTreeSet;

use transnet_common::{Edge, EdgeKind, Tag, TransnetError};

use crate::pipeline::runner::PhaseRunner;
use crate::testing::{account, status, test_config, MemoryGraphStore, MockRemoteSource};
use crate::traits::GraphStore;

/// Root "alice" with followers in Berlin, "Berlin, DE", and Paris, and
/// sampled friends spanning Berlin and Tokyo. Alice passes both filter
/// passes: 2/3 followers match "Berlin", and her friends span two
/// genuinely distinct locations.
fn berlin_scenario_source() -> MockRemoteSource {
    let alice = account(1, "alice", Some("Berlin"));
    let bob = account(2, "bob", Some("Berlin"));
    let carol = account(3, "carol", Some("Berlin, DE"));
    let dave = account(4, "dave", Some("Paris"));
    let eve = account(5, "eve", Some("Berlin"));
    let frank = account(6, "frank", Some("Tokyo"));

    MockRemoteSource::new()
        .on_profile(alice)
        .on_followers("alice", vec![bob, carol, dave])
        .on_friends("alice", vec![eve, frank])
        .on_statuses("bob", vec![])
        .on_statuses("carol", vec![])
        .on_statuses("dave", vec![])
        .on_statuses("eve", vec![status(100, 5, "markets open late today")])
        .on_statuses("frank", vec![status(101, 6, "landed in narita")])
}

type Snapshot = (
    BTreeSet<i64>,
    Vec<Edge>,
    BTreeSet<i64>,
    BTreeSet<i64>,
    BTreeSet<i64>,
);

fn snapshot(store: &MemoryGraphStore) -> Snapshot {
    (
        store.node_ids(),
        store.edges(),
        store.status_ids(),
        store.tag_ids(Tag::Filter0),
        store.tag_ids(Tag::Filter1),
    )
}

#[tokio::test]
async fn full_run_crawls_filters_and_pulls() {
    let store = MemoryGraphStore::new();
    let source = berlin_scenario_source();
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    let result = runner.run(0).await.unwrap();

    assert_eq!(result.reports.len(), 7);
    assert!(result.clean(), "no item should fail:\n{result}");

    // Only the root qualifies in either pass; her followers have no
    // persisted followers of their own.
    assert_eq!(store.tag_ids(Tag::Filter0), BTreeSet::from([1]));
    assert_eq!(store.tag_ids(Tag::Filter1), BTreeSet::from([1]));

    assert_eq!(store.node_ids(), BTreeSet::from([1, 2, 3, 4, 5, 6]));
    assert_eq!(store.status_ids(), BTreeSet::from([100, 101]));

    let edges = store.edges();
    assert_eq!(edges.len(), 5);
    assert!(edges.contains(&Edge {
        source_id: 2,
        target_id: 1,
        kind: EdgeKind::Follows,
    }));
    assert!(edges.contains(&Edge {
        source_id: 1,
        target_id: 5,
        kind: EdgeKind::Friend,
    }));
}

#[tokio::test]
async fn rerunning_follower_pull_is_idempotent() {
    let store = MemoryGraphStore::new();
    let source = berlin_scenario_source();
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    runner.run_span(0, 2).await.unwrap();
    let first = snapshot(&store);

    runner.run_span(1, 2).await.unwrap();
    let second = snapshot(&store);

    assert_eq!(first, second, "re-running the follower pull must not duplicate anything");
}

#[tokio::test]
async fn split_run_matches_single_run() {
    let store_single = MemoryGraphStore::new();
    let source_single = berlin_scenario_source();
    let runner = PhaseRunner::new(&store_single, &source_single, test_config("alice"));
    runner.run(0).await.unwrap();

    let store_split = MemoryGraphStore::new();
    let source_split = berlin_scenario_source();
    let runner = PhaseRunner::new(&store_split, &source_split, test_config("alice"));
    runner.run_span(0, 4).await.unwrap();
    runner.run_span(4, 7).await.unwrap();

    assert_eq!(snapshot(&store_single), snapshot(&store_split));
}

#[tokio::test]
async fn filter0_membership_is_monotonic() {
    let store = MemoryGraphStore::new();
    let source = berlin_scenario_source();
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    runner.run_span(0, 3).await.unwrap();
    let first = store.tag_ids(Tag::Filter0);

    runner.run_span(2, 3).await.unwrap();
    let second = store.tag_ids(Tag::Filter0);

    assert!(second.is_superset(&first));
    assert!(second.len() >= first.len());
}

#[tokio::test]
async fn resume_at_filter_pass_1_skips_earlier_phases() {
    // Pre-seeded state as if phases 0-3 ran in an earlier process: a
    // FILTER_0 account (not the root) with a sampled friend graph that
    // spans Berlin and Tokyo.
    let store = MemoryGraphStore::new();
    let bob = account(2, "bob", Some("Berlin"));
    let eve = account(5, "eve", Some("Berlin"));
    let frank = account(6, "frank", Some("Tokyo"));
    store.put_node(&bob).await.unwrap();
    store.put_node(&eve).await.unwrap();
    store.put_node(&frank).await.unwrap();
    for friend_id in [5, 6] {
        store
            .put_edge(&Edge {
                source_id: 2,
                target_id: friend_id,
                kind: EdgeKind::Friend,
            })
            .await
            .unwrap();
    }
    store.tag_add(Tag::Filter0, 2).await.unwrap();

    let source = MockRemoteSource::new()
        .on_friends("bob", vec![eve, frank])
        .on_followers("bob", vec![])
        .on_statuses("eve", vec![])
        .on_statuses("frank", vec![]);
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    let result = runner.run(4).await.unwrap();

    // Phases 4-6 only.
    assert_eq!(result.reports.len(), 3);
    assert_eq!(store.tag_ids(Tag::Filter1), BTreeSet::from([2]));

    // The skipped phases never touched the root.
    let calls = source.calls();
    assert!(!calls.iter().any(|c| c.starts_with("get_profile")));
    assert!(!calls.contains(&"get_follow_edges:alice".to_string()));
    // The extended pull did run for the tagged account.
    assert!(calls.contains(&"get_follow_edges:bob".to_string()));
}

#[tokio::test]
async fn item_failure_skips_item_and_continues() {
    // Two FILTER_0 accounts; carol's sample pull fails.
    let store = MemoryGraphStore::new();
    let bob = account(2, "bob", Some("Berlin"));
    let carol = account(3, "carol", Some("Berlin"));
    store.put_node(&bob).await.unwrap();
    store.put_node(&carol).await.unwrap();
    store.tag_add(Tag::Filter0, 2).await.unwrap();
    store.tag_add(Tag::Filter0, 3).await.unwrap();

    let eve = account(5, "eve", Some("Berlin"));
    let source = MockRemoteSource::new()
        .on_friends("bob", vec![eve])
        .failing("carol");
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    let result = runner.run_span(3, 5).await.unwrap();

    // The sample pull attempted both members and kept going past carol.
    let sample = &result.reports[0];
    assert_eq!(sample.attempted, 2);
    assert_eq!(sample.completed, 1);
    assert_eq!(sample.failed, 1);
    assert!(store.node_ids().contains(&5), "bob's friend was still persisted");

    // The next phase still executed over the full member set.
    let filter = &result.reports[1];
    assert_eq!(filter.attempted, 2);
    assert_eq!(filter.failed, 0);
}

#[tokio::test]
async fn unresolvable_root_aborts_run() {
    let store = MemoryGraphStore::new();
    let source = MockRemoteSource::new();
    let runner = PhaseRunner::new(&store, &source, test_config("alice"));

    let err = runner.run(0).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TransnetError>(),
        Some(TransnetError::RootUnresolvable(_))
    ));
    assert!(store.node_ids().is_empty());
}
