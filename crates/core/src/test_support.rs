// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{CellId, CellType, Event, Importance, MessageId, ReservationId, ThreadId, WorkerId};

pub fn agent_registered_event(name: &str) -> Event {
    Event::AgentRegistered {
        name: name.to_string(),
        program: "claude".to_string(),
        model: "test-model".to_string(),
        task_description: "test task".to_string(),
        registered_at_epoch_ms: 1_000_000,
    }
}

pub fn message_sent_event(from: &str, to: &[&str], subject: &str, thread: &str) -> Event {
    Event::MessageSent {
        id: MessageId::new(format!("msg-{subject}")),
        from_agent: from.to_string(),
        to_agents: to.iter().map(|s| s.to_string()).collect(),
        subject: subject.to_string(),
        body: "body".to_string(),
        thread_id: ThreadId::new(thread),
        importance: Importance::Normal,
        ack_required: false,
        created_at_epoch_ms: 1_000_000,
    }
}

pub fn reservation_created_event(id: &str, agent: &str, path: &str) -> Event {
    Event::ReservationCreated {
        id: ReservationId::new(id),
        agent_name: agent.to_string(),
        path_pattern: path.to_string(),
        exclusive: true,
        reason: None,
        created_at_epoch_ms: 1_000_000,
        expires_at_epoch_ms: None,
        lock_holder_id: id.to_string(),
    }
}

pub fn cell_created_event(id: &str, title: &str) -> Event {
    Event::CellCreated {
        id: CellId::new(id),
        cell_type: CellType::Task,
        title: title.to_string(),
        description: String::new(),
        priority: 2,
        parent_id: None,
        created_at_epoch_ms: 1_000_000,
    }
}

pub fn cell_work_started_event(cell: &str, worker: &str) -> Event {
    Event::CellWorkStarted {
        id: CellId::new(cell),
        worker_id: WorkerId::new(worker),
        started_at_epoch_ms: 1_000_000,
    }
}
