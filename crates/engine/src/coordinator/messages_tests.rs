use sw_core::{FakeClock, Importance};

use super::Coordinator;

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn send_rejects_no_recipients() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let err = coord
        .send("alice", &[], "subject", "body", None, Importance::Normal, false)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn send_creates_a_new_thread_on_first_message() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .send(
            "alice",
            &["bob".to_string()],
            "hello",
            "body",
            None,
            Importance::Normal,
            false,
        )
        .await
        .unwrap();

    assert_eq!(coord.with_state(|s| s.threads.len()), 1);
}

#[tokio::test]
async fn inbox_is_capped_regardless_of_requested_limit() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    for i in 0..10 {
        coord
            .send(
                "alice",
                &["bob".to_string()],
                &format!("subject {i}"),
                "body",
                None,
                Importance::Normal,
                false,
            )
            .await
            .unwrap();
    }

    let inbox = coord.inbox("bob", 1000, false);
    assert!(inbox.len() <= 5);
}

#[tokio::test]
async fn inbox_urgent_only_filters_out_non_urgent() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .send("alice", &["bob".to_string()], "normal", "body", None, Importance::Normal, false)
        .await
        .unwrap();
    coord
        .send("alice", &["bob".to_string()], "urgent", "body", None, Importance::Urgent, false)
        .await
        .unwrap();

    let inbox = coord.inbox("bob", 10, true);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].importance, Importance::Urgent);
}

#[tokio::test]
async fn read_message_returns_body_and_records_the_read() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let id = coord
        .send("alice", &["bob".to_string()], "subject", "the body", None, Importance::Normal, false)
        .await
        .unwrap();

    let body = coord.read_message(&id, "bob").await.unwrap();
    assert_eq!(body, "the body");
}

#[tokio::test]
async fn read_message_unknown_id_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let bogus = sw_core::MessageId::new("missing");
    let err = coord.read_message(&bogus, "bob").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::MessageNotFound(_)));
}

#[tokio::test]
async fn ack_unknown_message_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let bogus = sw_core::MessageId::new("missing");
    let err = coord.ack(&bogus, "bob").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::MessageNotFound(_)));
}

#[tokio::test]
async fn ack_is_recorded() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let id = coord
        .send("alice", &["bob".to_string()], "subject", "body", None, Importance::Normal, true)
        .await
        .unwrap();

    coord.ack(&id, "bob").await.unwrap();
}
