use sw_core::FakeClock;

use super::{Coordinator, ReserveOptions};

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn reserve_grants_a_free_path() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let outcome = coord
        .reserve("alice", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.granted.len(), 1);
    assert!(outcome.conflicts.is_empty());
}

#[tokio::test]
async fn second_exclusive_reservation_on_the_same_path_conflicts() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve("alice", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    let outcome = coord
        .reserve("bob", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    assert!(outcome.granted.is_empty());
    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(outcome.conflicts[0].holder_agent, "alice");
}

#[tokio::test]
async fn shared_reservations_on_the_same_path_do_not_conflict() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve(
            "alice",
            &["src/lib.rs".to_string()],
            ReserveOptions { exclusive: false, ..ReserveOptions::default() },
        )
        .await
        .unwrap();

    let outcome = coord
        .reserve(
            "bob",
            &["src/lib.rs".to_string()],
            ReserveOptions { exclusive: false, ..ReserveOptions::default() },
        )
        .await
        .unwrap();

    assert_eq!(outcome.granted.len(), 1);
    assert!(outcome.conflicts.is_empty());
}

#[tokio::test]
async fn shared_request_conflicts_with_an_existing_exclusive_holder() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve("alice", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    let outcome = coord
        .reserve(
            "bob",
            &["src/lib.rs".to_string()],
            ReserveOptions { exclusive: false, ..ReserveOptions::default() },
        )
        .await
        .unwrap();

    assert!(outcome.granted.is_empty());
    assert_eq!(outcome.conflicts.len(), 1);
}

#[tokio::test]
async fn exclusive_request_conflicts_with_an_existing_shared_holder() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve(
            "alice",
            &["src/lib.rs".to_string()],
            ReserveOptions { exclusive: false, ..ReserveOptions::default() },
        )
        .await
        .unwrap();

    let outcome = coord
        .reserve("bob", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    assert!(outcome.granted.is_empty());
    assert_eq!(outcome.conflicts.len(), 1);
    assert_eq!(outcome.conflicts[0].holder_agent, "alice");
}

#[tokio::test]
async fn release_frees_the_path_for_a_later_reservation() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve("alice", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();
    coord.release("alice", None).await.unwrap();

    let outcome = coord
        .reserve("bob", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.granted.len(), 1);
}

#[tokio::test]
async fn release_with_paths_only_frees_the_matching_path() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve(
            "alice",
            &["a.rs".to_string(), "b.rs".to_string()],
            ReserveOptions::default(),
        )
        .await
        .unwrap();
    coord.release("alice", Some(&["a.rs".to_string()])).await.unwrap();

    let active = coord.active_reservations(Some("alice"));
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].path_pattern, "b.rs");
}

#[tokio::test]
async fn glob_reservations_conflict_with_overlapping_concrete_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve("alice", &["src/**/*.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    let outcome = coord
        .reserve("bob", &["src/coordinator/mod.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    assert!(outcome.granted.is_empty());
    assert_eq!(outcome.conflicts.len(), 1);
}

#[tokio::test]
async fn reclaim_expired_reservations_releases_past_ttl() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve(
            "alice",
            &["src/lib.rs".to_string()],
            ReserveOptions {
                ttl_seconds: Some(0),
                ..ReserveOptions::default()
            },
        )
        .await
        .unwrap();

    let reclaimed = coord.reclaim_expired_reservations().await.unwrap();
    assert_eq!(reclaimed, 1);
    assert!(coord.active_reservations(Some("alice")).is_empty());
}

#[tokio::test]
async fn release_all_for_project_requires_coordinator_context() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let ctx = sw_core::CoordinatorContext::new("session-1");
    let err = coord.release_all_for_project(&ctx, "alice").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Guard { .. }));
}

#[tokio::test]
async fn release_all_for_project_succeeds_when_granted() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .reserve("alice", &["src/lib.rs".to_string()], ReserveOptions::default())
        .await
        .unwrap();

    let ctx = sw_core::CoordinatorContext::single_tenant("session-1");
    coord.release_all_for_project(&ctx, "alice").await.unwrap();

    assert!(coord.active_reservations(None).is_empty());
}
