// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{CellId, MessageId, ReservationId, ThreadId, WorkerId};

#[test]
fn event_serialization_roundtrip() {
    let events = vec![
        Event::AgentRegistered {
            name: "W1".to_string(),
            program: "claude".to_string(),
            model: "opus".to_string(),
            task_description: "fix bug".to_string(),
            registered_at_epoch_ms: 1_700_000_000_000,
        },
        Event::MessageSent {
            id: MessageId::new("m1"),
            from_agent: "W1".to_string(),
            to_agents: vec!["W2".to_string()],
            subject: "status update".to_string(),
            body: "done with src/a.ts".to_string(),
            thread_id: ThreadId::new("t1"),
            importance: Importance::High,
            ack_required: true,
            created_at_epoch_ms: 1_700_000_000_000,
        },
        Event::ReservationCreated {
            id: ReservationId::new("r1"),
            agent_name: "W1".to_string(),
            path_pattern: "src/a.ts".to_string(),
            exclusive: true,
            reason: None,
            created_at_epoch_ms: 1_700_000_000_000,
            expires_at_epoch_ms: None,
            lock_holder_id: "r1".to_string(),
        },
        Event::CellCreated {
            id: CellId::new("proj-abc123"),
            cell_type: CellType::Task,
            title: "Implement feature".to_string(),
            description: String::new(),
            priority: 1,
            parent_id: None,
            created_at_epoch_ms: 1_700_000_000_000,
        },
        Event::SubtaskOutcome {
            cell_id: CellId::new("proj-abc123.1"),
            worker_id: WorkerId::new("w1"),
            success: true,
            duration_ms: 5_000,
            bead_id: CellId::new("proj-abc123.1"),
        },
    ];

    for event in events {
        let json = serde_json::to_string(&event).expect("serialize");
        let decoded: Event = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, decoded);
    }
}

#[test]
fn event_type_discriminator_matches_wire_names() {
    assert_eq!(
        Event::AgentRegistered {
            name: "a".to_string(),
            program: "p".to_string(),
            model: "m".to_string(),
            task_description: "t".to_string(),
            registered_at_epoch_ms: 0,
        }
        .name(),
        "agent_registered"
    );
    let json = serde_json::to_value(Event::ReservationCreated {
        id: ReservationId::new("r1"),
        agent_name: "W1".to_string(),
        path_pattern: "src/a.ts".to_string(),
        exclusive: true,
        reason: None,
        created_at_epoch_ms: 0,
        expires_at_epoch_ms: None,
        lock_holder_id: "r1".to_string(),
    })
    .unwrap();
    assert_eq!(json["type"], "reservation_created");
}

#[test]
fn unknown_type_discriminator_decodes_to_custom() {
    let raw = r#"{"type": "some_future_event", "foo": "bar"}"#;
    let event: Event = serde_json::from_str(raw).expect("tolerates unknown variants");
    assert_eq!(event, Event::Custom);
}

#[test]
fn custom_is_never_serialized() {
    let json = serde_json::to_string(&Event::Custom).expect("serialize");
    assert_eq!(json, "null");
}

#[test]
fn cell_id_extracts_for_cell_scoped_events() {
    let event = Event::CellClosed {
        id: CellId::new("proj-1"),
        closed_reason: "done".to_string(),
        closed_at_epoch_ms: 0,
    };
    assert_eq!(event.cell_id(), Some(&CellId::new("proj-1")));

    let event = Event::AgentRegistered {
        name: "a".to_string(),
        program: "p".to_string(),
        model: "m".to_string(),
        task_description: "t".to_string(),
        registered_at_epoch_ms: 0,
    };
    assert_eq!(event.cell_id(), None);
}

#[test]
fn log_summary_is_non_empty_for_every_variant() {
    let events = vec![
        Event::ThreadCreated {
            thread_id: ThreadId::new("t1"),
            creator: "W1".to_string(),
            initial_subject: "hi".to_string(),
            first_message_id: MessageId::new("m1"),
        },
        Event::ReviewFeedback {
            cell_id: CellId::new("c1"),
            worker_id: WorkerId::new("w1"),
            verdict: ReviewVerdict::NeedsChanges,
            attempt: 1,
            remaining_attempts: 2,
            issues: vec!["fix typo".to_string()],
            reviewed_at_epoch_ms: 0,
        },
    ];
    for event in events {
        assert!(!event.log_summary().is_empty());
    }
}
