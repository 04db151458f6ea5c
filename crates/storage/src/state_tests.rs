// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::{CellId, CellType, Importance, MessageId, ReservationId, ThreadId, WorkerId};

fn agent_event(name: &str) -> Event {
    Event::AgentRegistered {
        name: name.to_string(),
        program: "claude".to_string(),
        model: "opus".to_string(),
        task_description: "fix bug".to_string(),
        registered_at_epoch_ms: 1_000,
    }
}

fn message_event(id: &str, from: &str, to: &[&str], thread: &str) -> Event {
    Event::MessageSent {
        id: MessageId::new(id),
        from_agent: from.to_string(),
        to_agents: to.iter().map(|s| s.to_string()).collect(),
        subject: "status update".to_string(),
        body: "done with src/a.ts".to_string(),
        thread_id: ThreadId::new(thread),
        importance: Importance::Normal,
        ack_required: true,
        created_at_epoch_ms: 1_000,
    }
}

fn cell_event(id: &str, title: &str) -> Event {
    Event::CellCreated {
        id: CellId::new(id),
        cell_type: CellType::Task,
        title: title.to_string(),
        description: String::new(),
        priority: 1,
        parent_id: None,
        created_at_epoch_ms: 1_000,
    }
}

fn reservation_event(id: &str, agent: &str, path: &str) -> Event {
    Event::ReservationCreated {
        id: ReservationId::new(id),
        agent_name: agent.to_string(),
        path_pattern: path.to_string(),
        exclusive: true,
        reason: None,
        created_at_epoch_ms: 1_000,
        expires_at_epoch_ms: None,
        lock_holder_id: id.to_string(),
    }
}

#[test]
fn agent_registration_is_idempotent_by_name() {
    let mut state = MaterializedState::new();
    state.apply_event(&agent_event("W1"));
    state.apply_event(&agent_event("W1"));
    assert_eq!(state.agents.len(), 1);
}

#[test]
fn duplicate_message_append_does_not_double_insert() {
    let mut state = MaterializedState::new();
    let event = message_event("m1", "W1", &["W2", "W3"], "t1");
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.messages.len(), 1);
    assert_eq!(state.message_recipients[&MessageId::new("m1")].len(), 2);
}

#[test]
fn inbox_never_leaks_body_and_respects_unread_filter() {
    let mut state = MaterializedState::new();
    state.apply_event(&message_event("m1", "W1", &["W2"], "t1"));

    let inbox = state.inbox_for_agent("W2", true, 10);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].subject, "status update");

    state.apply_event(&Event::MessageRead {
        message_id: MessageId::new("m1"),
        agent_name: "W2".to_string(),
        read_at_epoch_ms: 2_000,
        classification: "status".to_string(),
        is_broadcast: false,
    });
    assert!(state.inbox_for_agent("W2", true, 10).is_empty());
    assert_eq!(state.inbox_for_agent("W2", false, 10).len(), 1);
}

#[test]
fn inbox_limit_is_clamped_to_five() {
    let mut state = MaterializedState::new();
    for i in 0..8 {
        state.apply_event(&message_event(&format!("m{i}"), "W1", &["W2"], "t1"));
    }
    assert_eq!(state.inbox_for_agent("W2", false, 100).len(), 5);
}

#[test]
fn reservation_release_is_monotonic() {
    let mut state = MaterializedState::new();
    state.apply_event(&reservation_event("r1", "W1", "src/a.ts"));
    state.apply_event(&Event::ReservationReleased {
        id: ReservationId::new("r1"),
        released_at_epoch_ms: 5_000,
        reason: "done".to_string(),
    });
    state.apply_event(&Event::ReservationReleased {
        id: ReservationId::new("r1"),
        released_at_epoch_ms: 9_999,
        reason: "done again".to_string(),
    });
    assert_eq!(
        state.reservations[&ReservationId::new("r1")].released_at_epoch_ms,
        Some(5_000)
    );
}

#[test]
fn overlapping_reservation_is_reported_as_conflict() {
    let mut state = MaterializedState::new();
    state.apply_event(&reservation_event("r1", "W1", "src/*.ts"));
    let conflicts = state.active_reservation_conflicts("src/a.ts", 2_000);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].agent_name, "W1");
}

#[test]
fn cell_lifecycle_transitions_update_status_and_timestamps() {
    let mut state = MaterializedState::new();
    state.apply_event(&cell_event("proj-1", "fix the bug"));
    state.apply_event(&Event::CellWorkStarted {
        id: CellId::new("proj-1"),
        worker_id: WorkerId::new("w1"),
        started_at_epoch_ms: 2_000,
    });
    assert_eq!(
        state.get_cell(&CellId::new("proj-1")).unwrap().status,
        sw_core::CellStatus::InProgress
    );

    state.apply_event(&Event::CellClosed {
        id: CellId::new("proj-1"),
        closed_reason: "shipped".to_string(),
        closed_at_epoch_ms: 3_000,
    });
    let cell = state.get_cell(&CellId::new("proj-1")).unwrap();
    assert_eq!(cell.status, sw_core::CellStatus::Closed);
    assert_eq!(cell.closed_reason.as_deref(), Some("shipped"));
}

#[test]
fn tombstoned_cell_is_excluded_from_get_cell() {
    let mut state = MaterializedState::new();
    state.apply_event(&cell_event("proj-1", "fix the bug"));
    state.apply_event(&Event::CellDeleted {
        id: CellId::new("proj-1"),
        tombstoned_at_epoch_ms: 2_000,
    });
    assert!(state.get_cell(&CellId::new("proj-1")).is_none());
}

#[test]
fn deferred_resolve_is_ignored_after_first_resolution() {
    let mut state = MaterializedState::new();
    let id = sw_core::DeferredId::from_token("tok1");
    state.apply_event(&Event::DeferredCreated {
        id: id.clone(),
        created_at_epoch_ms: 1_000,
        expires_at_epoch_ms: 60_000,
    });
    state.apply_event(&Event::DeferredResolved {
        id: id.clone(),
        value: Some(serde_json::json!({"ok": true})),
        error: None,
        resolved_at_epoch_ms: 2_000,
    });
    state.apply_event(&Event::DeferredResolved {
        id: id.clone(),
        value: Some(serde_json::json!({"ok": false})),
        error: None,
        resolved_at_epoch_ms: 3_000,
    });
    let deferred = &state.deferred[&id];
    assert_eq!(deferred.value, Some(serde_json::json!({"ok": true})));
}
