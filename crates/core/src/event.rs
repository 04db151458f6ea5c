// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event log's atomic unit.
//!
//! `Event` is the payload carried by every appended log row. Each variant
//! corresponds to one `type` discriminator on the wire; `#[serde(tag =
//! "type")]` makes the JSON representation `{"type": "message_sent",
//! ...fields}` rather than a nested enum wrapper. Event handlers that fold
//! these into projections must be idempotent: replaying the same event
//! twice (crash recovery, migration re-run) must never double-count or
//! double-insert.

use crate::{CellId, DeferredId, MessageId, ReservationId, ThreadId, WorkerId};
use serde::{Deserialize, Serialize};

/// Importance tag carried by a message; drives urgent-only inbox filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for Importance {
    fn default() -> Self {
        Self::Normal
    }
}

/// Resolution a caller attaches to an advisory `file_conflict` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictResolution {
    Wait,
    Force,
    Abort,
}

/// Work-unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Bug,
    Feature,
    Task,
    Epic,
    Chore,
}

/// Work-unit lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Open,
    InProgress,
    Blocked,
    Closed,
}

/// Relationship kind for a `(cell_id, depends_on_id)` dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyRelationship {
    Blocks,
    Relates,
    Duplicates,
}

/// Verdict carried by a `review_feedback` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approved,
    NeedsChanges,
}

/// Decision kind recorded by the coordinator guardrail / audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorDecisionKind {
    SpawnSubtask,
    ReleaseAllForProject,
    ReleaseAllForAgent,
    ForceReservation,
    CloseEpic,
}

/// The atomic unit appended to the log. One variant per wire `type`
/// discriminator from the external interface surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "agent_registered")]
    AgentRegistered {
        name: String,
        program: String,
        model: String,
        task_description: String,
        registered_at_epoch_ms: i64,
    },

    #[serde(rename = "message_sent")]
    MessageSent {
        id: MessageId,
        from_agent: String,
        to_agents: Vec<String>,
        subject: String,
        body: String,
        thread_id: ThreadId,
        importance: Importance,
        ack_required: bool,
        created_at_epoch_ms: i64,
    },

    #[serde(rename = "message_read")]
    MessageRead {
        message_id: MessageId,
        agent_name: String,
        read_at_epoch_ms: i64,
        classification: String,
        is_broadcast: bool,
    },

    #[serde(rename = "message_acked")]
    MessageAcked {
        message_id: MessageId,
        agent_name: String,
        acked_at_epoch_ms: i64,
    },

    #[serde(rename = "thread_created")]
    ThreadCreated {
        thread_id: ThreadId,
        creator: String,
        initial_subject: String,
        first_message_id: MessageId,
    },

    #[serde(rename = "thread_activity")]
    ThreadActivity {
        thread_id: ThreadId,
        message_count: u32,
        participant_count: u32,
        last_message_agent: String,
    },

    #[serde(rename = "reservation_created")]
    ReservationCreated {
        id: ReservationId,
        agent_name: String,
        path_pattern: String,
        exclusive: bool,
        reason: Option<String>,
        created_at_epoch_ms: i64,
        expires_at_epoch_ms: Option<i64>,
        lock_holder_id: String,
    },

    #[serde(rename = "reservation_released")]
    ReservationReleased {
        id: ReservationId,
        released_at_epoch_ms: i64,
        reason: String,
    },

    #[serde(rename = "reservation_released_all")]
    ReservationReleasedAll {
        ids: Vec<ReservationId>,
        released_at_epoch_ms: i64,
        actor: String,
    },

    #[serde(rename = "reservation_released_for_agent")]
    ReservationReleasedForAgent {
        ids: Vec<ReservationId>,
        target_agent: String,
        released_at_epoch_ms: i64,
        actor: String,
    },

    #[serde(rename = "file_conflict")]
    FileConflict {
        requester: String,
        requested_path: String,
        holder_agent: String,
        holder_id: ReservationId,
        resolution: ConflictResolution,
        reported_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_created")]
    CellCreated {
        id: CellId,
        cell_type: CellType,
        title: String,
        description: String,
        priority: u8,
        parent_id: Option<CellId>,
        created_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_updated")]
    CellUpdated {
        id: CellId,
        title: Option<String>,
        description: Option<String>,
        priority: Option<u8>,
        updated_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_status_changed")]
    CellStatusChanged {
        id: CellId,
        from: CellStatus,
        to: CellStatus,
        changed_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_closed")]
    CellClosed {
        id: CellId,
        closed_reason: String,
        closed_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_reopened")]
    CellReopened { id: CellId, reopened_at_epoch_ms: i64 },

    #[serde(rename = "cell_deleted")]
    CellDeleted {
        id: CellId,
        tombstoned_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_dependency_added")]
    CellDependencyAdded {
        cell_id: CellId,
        depends_on_id: CellId,
        relationship: DependencyRelationship,
    },

    #[serde(rename = "cell_dependency_removed")]
    CellDependencyRemoved {
        cell_id: CellId,
        depends_on_id: CellId,
    },

    #[serde(rename = "cell_label_added")]
    CellLabelAdded { id: CellId, label: String },

    #[serde(rename = "cell_label_removed")]
    CellLabelRemoved { id: CellId, label: String },

    #[serde(rename = "cell_comment_added")]
    CellCommentAdded {
        id: CellId,
        author: String,
        body: String,
        created_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_epic_child_added")]
    CellEpicChildAdded { epic_id: CellId, child_id: CellId },

    #[serde(rename = "cell_epic_closure_eligible")]
    CellEpicClosureEligible {
        epic_id: CellId,
        child_ids: Vec<CellId>,
        aggregate_duration_ms: i64,
        files_touched: Vec<String>,
    },

    #[serde(rename = "cell_assigned")]
    CellAssigned {
        id: CellId,
        assignee: String,
        assigned_at_epoch_ms: i64,
    },

    #[serde(rename = "cell_work_started")]
    CellWorkStarted {
        id: CellId,
        worker_id: WorkerId,
        started_at_epoch_ms: i64,
    },

    #[serde(rename = "subtask_outcome")]
    SubtaskOutcome {
        cell_id: CellId,
        worker_id: WorkerId,
        success: bool,
        duration_ms: i64,
        bead_id: CellId,
    },

    #[serde(rename = "review_feedback")]
    ReviewFeedback {
        cell_id: CellId,
        worker_id: WorkerId,
        verdict: ReviewVerdict,
        attempt: u32,
        remaining_attempts: u32,
        issues: Vec<String>,
        reviewed_at_epoch_ms: i64,
    },

    #[serde(rename = "coordinator_decision")]
    CoordinatorDecision {
        session_id: String,
        kind: CoordinatorDecisionKind,
        subject: String,
        decided_at_epoch_ms: i64,
    },

    #[serde(rename = "coordinator_violation")]
    CoordinatorViolation {
        session_id: String,
        guard: String,
        attempted_operation: String,
        occurred_at_epoch_ms: i64,
    },

    #[serde(rename = "coordinator_outcome")]
    CoordinatorOutcome {
        session_id: String,
        cells_completed: u32,
        cells_failed: u32,
        finished_at_epoch_ms: i64,
    },

    #[serde(rename = "coordinator_compaction")]
    CoordinatorCompaction {
        session_id: String,
        events_before: u64,
        events_after: u64,
        compacted_at_epoch_ms: i64,
    },

    #[serde(rename = "deferred_created")]
    DeferredCreated {
        id: DeferredId,
        created_at_epoch_ms: i64,
        expires_at_epoch_ms: i64,
    },

    #[serde(rename = "deferred_resolved")]
    DeferredResolved {
        id: DeferredId,
        value: Option<serde_json::Value>,
        error: Option<String>,
        resolved_at_epoch_ms: i64,
    },

    #[serde(rename = "eval_run_recorded")]
    EvalRunRecorded {
        eval_name: String,
        score: f64,
        recorded_at_epoch_ms: i64,
    },

    /// Forward-compatibility catch-all: any unrecognized `type`
    /// discriminator deserializes here instead of failing the whole read.
    /// Never produced by this codebase's own writers.
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    /// The wire `type` discriminator for this variant; used for `--module`
    /// filtering on the `log` CLI command and for human-readable tails.
    pub fn name(&self) -> &'static str {
        match self {
            Event::AgentRegistered { .. } => "agent_registered",
            Event::MessageSent { .. } => "message_sent",
            Event::MessageRead { .. } => "message_read",
            Event::MessageAcked { .. } => "message_acked",
            Event::ThreadCreated { .. } => "thread_created",
            Event::ThreadActivity { .. } => "thread_activity",
            Event::ReservationCreated { .. } => "reservation_created",
            Event::ReservationReleased { .. } => "reservation_released",
            Event::ReservationReleasedAll { .. } => "reservation_released_all",
            Event::ReservationReleasedForAgent { .. } => "reservation_released_for_agent",
            Event::FileConflict { .. } => "file_conflict",
            Event::CellCreated { .. } => "cell_created",
            Event::CellUpdated { .. } => "cell_updated",
            Event::CellStatusChanged { .. } => "cell_status_changed",
            Event::CellClosed { .. } => "cell_closed",
            Event::CellReopened { .. } => "cell_reopened",
            Event::CellDeleted { .. } => "cell_deleted",
            Event::CellDependencyAdded { .. } => "cell_dependency_added",
            Event::CellDependencyRemoved { .. } => "cell_dependency_removed",
            Event::CellLabelAdded { .. } => "cell_label_added",
            Event::CellLabelRemoved { .. } => "cell_label_removed",
            Event::CellCommentAdded { .. } => "cell_comment_added",
            Event::CellEpicChildAdded { .. } => "cell_epic_child_added",
            Event::CellEpicClosureEligible { .. } => "cell_epic_closure_eligible",
            Event::CellAssigned { .. } => "cell_assigned",
            Event::CellWorkStarted { .. } => "cell_work_started",
            Event::SubtaskOutcome { .. } => "subtask_outcome",
            Event::ReviewFeedback { .. } => "review_feedback",
            Event::CoordinatorDecision { .. } => "coordinator_decision",
            Event::CoordinatorViolation { .. } => "coordinator_violation",
            Event::CoordinatorOutcome { .. } => "coordinator_outcome",
            Event::CoordinatorCompaction { .. } => "coordinator_compaction",
            Event::DeferredCreated { .. } => "deferred_created",
            Event::DeferredResolved { .. } => "deferred_resolved",
            Event::EvalRunRecorded { .. } => "eval_run_recorded",
            Event::Custom => "custom",
        }
    }

    /// One-line human-readable summary for the `log` CLI command's tail view.
    pub fn log_summary(&self) -> String {
        match self {
            Event::AgentRegistered { name, program, .. } => {
                format!("agent {name} registered ({program})")
            }
            Event::MessageSent {
                from_agent,
                to_agents,
                subject,
                ..
            } => format!("{from_agent} -> [{}]: {subject}", to_agents.join(", ")),
            Event::MessageRead {
                agent_name,
                message_id,
                ..
            } => format!("{agent_name} read {message_id}"),
            Event::MessageAcked {
                agent_name,
                message_id,
                ..
            } => format!("{agent_name} acked {message_id}"),
            Event::ThreadCreated {
                thread_id, creator, ..
            } => format!("thread {thread_id} created by {creator}"),
            Event::ThreadActivity {
                thread_id,
                message_count,
                ..
            } => format!("thread {thread_id}: {message_count} messages"),
            Event::ReservationCreated {
                agent_name,
                path_pattern,
                exclusive,
                ..
            } => format!(
                "{agent_name} reserved {path_pattern} ({})",
                if *exclusive { "exclusive" } else { "shared" }
            ),
            Event::ReservationReleased { id, reason, .. } => {
                format!("reservation {id} released ({reason})")
            }
            Event::ReservationReleasedAll { ids, actor, .. } => {
                format!("{actor} released all ({} reservations)", ids.len())
            }
            Event::ReservationReleasedForAgent {
                target_agent, ids, ..
            } => format!("released {} reservations for {target_agent}", ids.len()),
            Event::FileConflict {
                requester,
                requested_path,
                holder_agent,
                ..
            } => format!("conflict: {requester} vs {holder_agent} on {requested_path}"),
            Event::CellCreated { id, title, .. } => format!("cell {id} created: {title}"),
            Event::CellUpdated { id, .. } => format!("cell {id} updated"),
            Event::CellStatusChanged { id, from, to, .. } => {
                format!("cell {id}: {from:?} -> {to:?}")
            }
            Event::CellClosed {
                id, closed_reason, ..
            } => format!("cell {id} closed ({closed_reason})"),
            Event::CellReopened { id, .. } => format!("cell {id} reopened"),
            Event::CellDeleted { id, .. } => format!("cell {id} tombstoned"),
            Event::CellDependencyAdded {
                cell_id,
                depends_on_id,
                ..
            } => format!("cell {cell_id} depends on {depends_on_id}"),
            Event::CellDependencyRemoved {
                cell_id,
                depends_on_id,
            } => format!("cell {cell_id} no longer depends on {depends_on_id}"),
            Event::CellLabelAdded { id, label } => format!("cell {id} labeled {label}"),
            Event::CellLabelRemoved { id, label } => format!("cell {id} unlabeled {label}"),
            Event::CellCommentAdded { id, author, .. } => format!("{author} commented on {id}"),
            Event::CellEpicChildAdded { epic_id, child_id } => {
                format!("epic {epic_id} gained child {child_id}")
            }
            Event::CellEpicClosureEligible {
                epic_id, child_ids, ..
            } => format!(
                "epic {epic_id} closure-eligible ({} children)",
                child_ids.len()
            ),
            Event::CellAssigned { id, assignee, .. } => {
                format!("cell {id} assigned to {assignee}")
            }
            Event::CellWorkStarted { id, worker_id, .. } => {
                format!("worker {worker_id} started work on {id}")
            }
            Event::SubtaskOutcome {
                cell_id, success, ..
            } => format!(
                "subtask {cell_id} {}",
                if *success { "succeeded" } else { "failed" }
            ),
            Event::ReviewFeedback {
                cell_id,
                verdict,
                attempt,
                ..
            } => format!("review of {cell_id}: {verdict:?} (attempt {attempt})"),
            Event::CoordinatorDecision { kind, subject, .. } => {
                format!("coordinator {kind:?}: {subject}")
            }
            Event::CoordinatorViolation {
                guard,
                attempted_operation,
                ..
            } => format!("guard {guard} blocked {attempted_operation}"),
            Event::CoordinatorOutcome {
                cells_completed,
                cells_failed,
                ..
            } => format!("coordinator finished: {cells_completed} ok, {cells_failed} failed"),
            Event::CoordinatorCompaction {
                events_before,
                events_after,
                ..
            } => format!("compacted {events_before} -> {events_after} events"),
            Event::DeferredCreated { id, .. } => format!("deferred {id} created"),
            Event::DeferredResolved { id, error, .. } => {
                if error.is_some() {
                    format!("deferred {id} resolved with error")
                } else {
                    format!("deferred {id} resolved")
                }
            }
            Event::EvalRunRecorded {
                eval_name, score, ..
            } => format!("eval {eval_name} run recorded: {score}"),
            Event::Custom => "custom event".to_string(),
        }
    }

    /// The cell this event pertains to, if any. Lets projections route
    /// cell-scoped events without an exhaustive match at every call site.
    pub fn cell_id(&self) -> Option<&CellId> {
        match self {
            Event::CellCreated { id, .. }
            | Event::CellUpdated { id, .. }
            | Event::CellStatusChanged { id, .. }
            | Event::CellClosed { id, .. }
            | Event::CellReopened { id, .. }
            | Event::CellDeleted { id, .. }
            | Event::CellLabelAdded { id, .. }
            | Event::CellLabelRemoved { id, .. }
            | Event::CellCommentAdded { id, .. }
            | Event::CellAssigned { id, .. }
            | Event::CellWorkStarted { id, .. } => Some(id),
            Event::CellDependencyAdded { cell_id, .. }
            | Event::CellDependencyRemoved { cell_id, .. }
            | Event::SubtaskOutcome { cell_id, .. }
            | Event::ReviewFeedback { cell_id, .. } => Some(cell_id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
