use sw_core::FakeClock;

use super::Coordinator;

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn register_agent_rejects_empty_name() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let err = coord.register_agent("  ", "claude", "opus", "t").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn register_agent_records_the_agent() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord.register_agent("alice", "claude", "opus", "fix the bug").await.unwrap();

    let recorded = coord.with_state(|s| s.agents.get("alice").cloned());
    let agent = recorded.expect("agent recorded");
    assert_eq!(agent.program, "claude");
    assert_eq!(agent.model, "opus");
}

#[tokio::test]
async fn re_registering_the_same_name_touches_rather_than_duplicates() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord.register_agent("alice", "claude", "opus", "t1").await.unwrap();
    coord.register_agent("alice", "claude", "sonnet", "t2").await.unwrap();

    // First write wins on the agent's fields; only `last_active` advances.
    assert_eq!(coord.with_state(|s| s.agents.len()), 1);
    let agent = coord.with_state(|s| s.agents.get("alice").cloned()).unwrap();
    assert_eq!(agent.model, "opus");
}
