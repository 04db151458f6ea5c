use sw_core::FakeClock;

use super::*;

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn open_creates_project_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());
    assert_eq!(coord.project_key(), "proj");
    assert!(coord.state_dir().ends_with("proj"));
    assert!(coord.state_dir().is_dir());
}

#[tokio::test]
async fn append_updates_projection_under_the_same_lock() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .register_agent("alice", "claude", "opus", "fix the bug")
        .await
        .unwrap();

    let seen = coord.with_state(|s| s.agents.contains_key("alice"));
    assert!(seen);
}

#[tokio::test]
async fn with_state_reflects_multiple_appends() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
    coord.register_agent("bob", "claude", "sonnet", "t2").await.unwrap();

    let count = coord.with_state(|s| s.agents.len());
    assert_eq!(count, 2);
}

#[tokio::test]
async fn checkpoint_now_writes_a_snapshot_without_losing_state() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
    coord.checkpoint_now().unwrap();

    let snapshot_path = coord.state_dir().join("snapshot.zst");
    assert!(snapshot_path.exists());

    let seen = coord.with_state(|s| s.agents.contains_key("alice"));
    assert!(seen);
}

#[tokio::test]
async fn reopening_replays_appended_events() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let coord = open(tmp.path());
        coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
    }

    let reopened = open(tmp.path());
    let seen = reopened.with_state(|s| s.agents.contains_key("alice"));
    assert!(seen);
}

#[tokio::test]
async fn reopening_after_checkpoint_replays_from_snapshot_plus_wal_tail() {
    let tmp = tempfile::tempdir().unwrap();
    {
        let coord = open(tmp.path());
        coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
        coord.checkpoint_now().unwrap();
        coord.register_agent("bob", "claude", "sonnet", "t2").await.unwrap();
    }

    let reopened = open(tmp.path());
    let (has_alice, has_bob) =
        reopened.with_state(|s| (s.agents.contains_key("alice"), s.agents.contains_key("bob")));
    assert!(has_alice);
    assert!(has_bob);
}

#[tokio::test]
async fn sequence_is_strictly_increasing_across_appends() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
    coord.register_agent("bob", "claude", "sonnet", "t2").await.unwrap();
    coord.register_agent("carol", "codex", "gpt", "t3").await.unwrap();

    let entries = coord.entries_after(0).unwrap();
    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    let mut sorted = seqs.clone();
    sorted.sort_unstable();
    assert_eq!(seqs, sorted, "sequence must be non-decreasing in append order");
    for window in seqs.windows(2) {
        assert!(window[1] > window[0], "sequence must strictly increase");
    }
}

/// S8 -- fan-out resumption: a subscriber joining at offset=5 with events
/// already at sequences 3, 6, 7 and two more arriving live at 8, 9 must see
/// 6, 7, 8, 9 in order, with no duplicates and no sequence 3.
#[tokio::test]
async fn fanout_resumption_merges_backlog_and_live_without_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    for i in 0..3 {
        coord
            .register_agent(&format!("pre-{i}"), "claude", "opus", "t")
            .await
            .unwrap();
    }
    // Three agents registered above land at sequences 1, 2, 3.

    let mut live_rx = coord.subscribe();
    let backlog = coord.entries_after(3).unwrap();

    coord.register_agent("post-a", "claude", "opus", "t").await.unwrap();
    coord.register_agent("post-b", "claude", "opus", "t").await.unwrap();

    // Mirror the live-fan-out server's merge: replay backlog, then drain
    // live events, skipping anything at or before the last backlog seq.
    let mut received = Vec::new();
    let mut last_seq = 0;
    for entry in backlog {
        last_seq = entry.seq;
        received.push(entry.seq);
    }
    while received.len() < 2 {
        match live_rx.try_recv() {
            Ok(entry) if entry.seq > last_seq => {
                last_seq = entry.seq;
                received.push(entry.seq);
            }
            Ok(_) => continue,
            Err(_) => break,
        }
    }

    assert!(!received.contains(&3));
    assert!(received.windows(2).all(|w| w[1] > w[0]));
    let unique: std::collections::HashSet<_> = received.iter().collect();
    assert_eq!(unique.len(), received.len(), "no duplicate sequences");
}

#[tokio::test]
async fn distinct_project_keys_get_distinct_storage() {
    let tmp = tempfile::tempdir().unwrap();
    let a = Coordinator::open_with_clock(tmp.path(), "proj-a", FakeClock::new()).unwrap();
    let b = Coordinator::open_with_clock(tmp.path(), "proj-b", FakeClock::new()).unwrap();

    a.register_agent("alice", "claude", "opus", "t1").await.unwrap();

    assert!(a.with_state(|s| s.agents.contains_key("alice")));
    assert!(!b.with_state(|s| s.agents.contains_key("alice")));
    assert_ne!(a.state_dir(), b.state_dir());
}
