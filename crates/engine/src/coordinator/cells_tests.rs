use sw_core::{CellId, CellStatus, CellType, DependencyRelationship, FakeClock, MAX_PRIORITY};

use super::Coordinator;

fn open(dir: &std::path::Path) -> Coordinator<FakeClock> {
    Coordinator::open_with_clock(dir, "proj", FakeClock::new()).unwrap()
}

#[tokio::test]
async fn create_cell_rejects_priority_above_max() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let err = coord
        .create_cell(
            CellId::new("c1"),
            CellType::Task,
            "title",
            "desc",
            MAX_PRIORITY + 1,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn create_cell_rejects_oversized_title() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let title: String = "x".repeat(sw_core::MAX_TITLE_LEN + 1);
    let err = coord
        .create_cell(CellId::new("c1"), CellType::Task, &title, "desc", 0, None)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn create_cell_at_max_priority_succeeds() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    coord
        .create_cell(CellId::new("c1"), CellType::Bug, "title", "desc", MAX_PRIORITY, None)
        .await
        .unwrap();

    let cell = coord.with_state(|s| s.get_cell(&CellId::new("c1")).cloned()).unwrap();
    assert_eq!(cell.priority, MAX_PRIORITY);
}

#[tokio::test]
async fn close_cell_with_open_children_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let epic = CellId::new("epic");
    let child = CellId::new("epic.1");
    coord.create_cell(epic.clone(), CellType::Epic, "epic", "", 0, None).await.unwrap();
    coord.add_epic_child(&epic, &child).await.unwrap();
    coord
        .create_cell(child.clone(), CellType::Task, "child", "", 0, Some(epic.clone()))
        .await
        .unwrap();

    let err = coord.close_cell(&epic, "done").await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn closing_the_last_open_child_emits_epic_closure_eligible() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let epic = CellId::new("epic");
    let child = CellId::new("epic.1");
    coord.create_cell(epic.clone(), CellType::Epic, "epic", "", 0, None).await.unwrap();
    coord.add_epic_child(&epic, &child).await.unwrap();
    coord
        .create_cell(child.clone(), CellType::Task, "child", "", 0, Some(epic.clone()))
        .await
        .unwrap();

    coord.close_cell(&child, "done").await.unwrap();

    // The epic itself is not auto-closed -- closure eligibility is a
    // distinct signal from closure.
    let epic_status = coord.with_state(|s| s.get_cell(&epic).map(|c| c.status));
    assert_eq!(epic_status, Some(CellStatus::Open));
}

#[tokio::test]
async fn add_epic_child_rejects_non_epic_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let a = CellId::new("a");
    let b = CellId::new("b");
    coord.create_cell(a.clone(), CellType::Task, "a", "", 0, None).await.unwrap();
    coord.create_cell(b.clone(), CellType::Task, "b", "", 0, None).await.unwrap();

    let err = coord.add_epic_child(&a, &b).await.unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::Validation(_)));
}

#[tokio::test]
async fn update_cell_against_unknown_id_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let err = coord
        .update_cell(&CellId::new("missing"), Some("t".to_string()), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::CoordinatorError::CellNotFound(_)));
}

#[tokio::test]
async fn add_dependency_records_the_edge() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let a = CellId::new("a");
    let b = CellId::new("b");
    coord.create_cell(a.clone(), CellType::Task, "a", "", 0, None).await.unwrap();
    coord.create_cell(b.clone(), CellType::Task, "b", "", 0, None).await.unwrap();

    coord.add_dependency(&a, &b, DependencyRelationship::Blocks).await.unwrap();

    let has_dep = coord.with_state(|s| {
        s.cell_dependencies
            .iter()
            .any(|d| d.cell_id == a && d.depends_on_id == b)
    });
    assert!(has_dep);
}

#[tokio::test]
async fn reopen_cell_clears_closed_status() {
    let tmp = tempfile::tempdir().unwrap();
    let coord = open(tmp.path());

    let a = CellId::new("a");
    coord.create_cell(a.clone(), CellType::Task, "a", "", 0, None).await.unwrap();
    coord.close_cell(&a, "done").await.unwrap();
    coord.reopen_cell(&a).await.unwrap();

    let status = coord.with_state(|s| s.get_cell(&a).map(|c| c.status));
    assert_eq!(status, Some(CellStatus::Open));
}
