use sw_core::{CoordinatorContext, FakeClock};

use super::Coordinator;

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn ungranted_context_is_rejected_and_recorded() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let ctx = CoordinatorContext::new("session-1");
    let err = coord.guard_coordinator(&ctx, "forceReservation").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Guard { .. }));

    let violations = coord.with_state(|s| s.audit_log.len());
    assert_eq!(violations, 1);
}

#[tokio::test]
async fn granted_context_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let ctx = CoordinatorContext::single_tenant("session-1");
    coord.guard_coordinator(&ctx, "forceReservation").await.unwrap();
}

#[tokio::test]
async fn record_decision_appends_an_audit_row() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let ctx = CoordinatorContext::single_tenant("session-1");
    coord
        .record_decision(&ctx, sw_core::CoordinatorDecisionKind::ForceReservation, "alice")
        .await
        .unwrap();

    let count = coord.with_state(|s| s.audit_log.len());
    assert_eq!(count, 1);
}
