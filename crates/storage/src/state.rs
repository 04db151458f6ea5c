// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay.
//!
//! `apply_event` is the single fold every projection goes through, whether
//! driven by a live append or by snapshot-recovery replay. Every arm must be
//! idempotent: replaying the same event twice (crash recovery, migration
//! re-run) must never double-insert or double-count.

use sw_core::{
    Agent, Cell, CellDependency, CellId, CellStatus, Cursor, Deferred, DeferredId, Event,
    InboxEntry, Message, MessageId, MessageRecipient, Reservation, ReservationId, ThreadId,
    WorkerId, WorkerPhase, WorkerRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A thread's rollup, recomputed incrementally as messages land on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub id: ThreadId,
    pub creator: String,
    pub initial_subject: String,
    pub first_message_id: Option<MessageId>,
    pub message_ids: Vec<MessageId>,
    pub participants: Vec<String>,
    pub last_message_agent: String,
}

impl ThreadRecord {
    fn record_message(&mut self, message_id: &MessageId, from_agent: &str) {
        self.message_ids.push(message_id.clone());
        if !self.participants.iter().any(|p| p == from_agent) {
            self.participants.push(from_agent.to_string());
        }
        self.last_message_agent = from_agent.to_string();
    }
}

/// Append-only audit trail of coordinator-guardrail decisions and
/// violations; never mutated, only appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorAuditRow {
    pub session_id: String,
    pub kind: String,
    pub detail: String,
    pub at_epoch_ms: i64,
}

/// The complete, replay-derived state for one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializedState {
    pub agents: HashMap<String, Agent>,
    pub messages: HashMap<MessageId, Message>,
    /// `(message_id -> (agent_name -> recipient row))`.
    pub message_recipients: HashMap<MessageId, HashMap<String, MessageRecipient>>,
    pub threads: HashMap<ThreadId, ThreadRecord>,
    pub reservations: HashMap<ReservationId, Reservation>,
    pub cells: HashMap<CellId, Cell>,
    pub cell_dependencies: Vec<CellDependency>,
    pub cell_comments: Vec<CellCommentRow>,
    pub cell_labels: HashMap<CellId, Vec<String>>,
    pub deferred: HashMap<DeferredId, Deferred>,
    pub cursors: HashMap<String, Cursor>,
    pub workers: HashMap<WorkerId, WorkerRecord>,
    pub audit_log: Vec<CoordinatorAuditRow>,
    /// Eval run history per eval name, chronological by append order.
    pub eval_runs: HashMap<String, Vec<EvalRunRow>>,
}

/// One recorded run of an eval, as folded from `eval_run_recorded`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRunRow {
    pub score: f64,
    pub recorded_at_epoch_ms: i64,
}

/// A detected score drop between two consecutive runs of the same eval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub eval_name: String,
    pub previous_score: f64,
    pub current_score: f64,
    /// `previous_score - current_score`; positive for a drop.
    pub delta: f64,
    /// `(current_score - previous_score) / previous_score * 100`; negative
    /// for a drop.
    pub delta_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellCommentRow {
    pub cell_id: CellId,
    pub author: String,
    pub body: String,
    pub created_at_epoch_ms: i64,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the projections. Must be safe to call twice with
    /// the same event (replay, migration re-run).
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::AgentRegistered {
                name,
                program,
                model,
                task_description,
                registered_at_epoch_ms,
            } => {
                self.agents
                    .entry(name.clone())
                    .and_modify(|a| a.touch(*registered_at_epoch_ms))
                    .or_insert_with(|| Agent {
                        name: name.clone(),
                        program: program.clone(),
                        model: model.clone(),
                        task_description: task_description.clone(),
                        registered_at_epoch_ms: *registered_at_epoch_ms,
                        last_active_at_epoch_ms: *registered_at_epoch_ms,
                    });
            }

            Event::MessageSent {
                id,
                from_agent,
                to_agents,
                subject,
                body,
                thread_id,
                importance,
                ack_required,
                created_at_epoch_ms,
            } => {
                if self.messages.contains_key(id) {
                    return;
                }
                self.messages.insert(
                    id.clone(),
                    Message {
                        id: id.clone(),
                        from_agent: from_agent.clone(),
                        to_agents: to_agents.clone(),
                        subject: subject.clone(),
                        body: body.clone(),
                        thread_id: thread_id.clone(),
                        importance: *importance,
                        ack_required: *ack_required,
                        created_at_epoch_ms: *created_at_epoch_ms,
                        classification: None,
                    },
                );

                let recipients = self.message_recipients.entry(id.clone()).or_default();
                for agent in to_agents {
                    recipients.entry(agent.clone()).or_insert(MessageRecipient {
                        message_id: id.clone(),
                        agent_name: agent.clone(),
                        read_at_epoch_ms: None,
                        acked_at_epoch_ms: None,
                    });
                }

                let thread = self.threads.entry(thread_id.clone()).or_insert_with(|| {
                    ThreadRecord {
                        id: thread_id.clone(),
                        creator: from_agent.clone(),
                        initial_subject: subject.clone(),
                        first_message_id: Some(id.clone()),
                        message_ids: Vec::new(),
                        participants: Vec::new(),
                        last_message_agent: String::new(),
                    }
                });
                if !thread.message_ids.contains(id) {
                    thread.record_message(id, from_agent);
                }
            }

            Event::MessageRead {
                message_id,
                agent_name,
                read_at_epoch_ms,
                classification,
                is_broadcast: _,
            } => {
                if let Some(msg) = self.messages.get_mut(message_id) {
                    if msg.classification.is_none() {
                        msg.classification = Some(classification.clone());
                    }
                }
                if let Some(recipient) = self
                    .message_recipients
                    .get_mut(message_id)
                    .and_then(|m| m.get_mut(agent_name))
                {
                    if recipient.read_at_epoch_ms.is_none() {
                        recipient.read_at_epoch_ms = Some(*read_at_epoch_ms);
                    }
                }
            }

            Event::MessageAcked {
                message_id,
                agent_name,
                acked_at_epoch_ms,
            } => {
                if let Some(recipient) = self
                    .message_recipients
                    .get_mut(message_id)
                    .and_then(|m| m.get_mut(agent_name))
                {
                    if recipient.acked_at_epoch_ms.is_none() {
                        recipient.acked_at_epoch_ms = Some(*acked_at_epoch_ms);
                    }
                }
            }

            Event::ThreadCreated {
                thread_id,
                creator,
                initial_subject,
                first_message_id,
            } => {
                self.threads.entry(thread_id.clone()).or_insert_with(|| ThreadRecord {
                    id: thread_id.clone(),
                    creator: creator.clone(),
                    initial_subject: initial_subject.clone(),
                    first_message_id: Some(first_message_id.clone()),
                    message_ids: Vec::new(),
                    participants: Vec::new(),
                    last_message_agent: creator.clone(),
                });
            }

            Event::ThreadActivity { .. } => {
                // Derived on demand by emitThreadActivity; not separately projected.
            }

            Event::ReservationCreated {
                id,
                agent_name,
                path_pattern,
                exclusive,
                reason,
                created_at_epoch_ms,
                expires_at_epoch_ms,
                lock_holder_id,
            } => {
                self.reservations.entry(id.clone()).or_insert_with(|| Reservation {
                    id: id.clone(),
                    agent_name: agent_name.clone(),
                    path_pattern: path_pattern.clone(),
                    exclusive: *exclusive,
                    reason: reason.clone(),
                    created_at_epoch_ms: *created_at_epoch_ms,
                    expires_at_epoch_ms: *expires_at_epoch_ms,
                    released_at_epoch_ms: None,
                    lock_holder_id: lock_holder_id.clone(),
                });
            }

            Event::ReservationReleased {
                id,
                released_at_epoch_ms,
                reason: _,
            } => {
                if let Some(r) = self.reservations.get_mut(id) {
                    if r.released_at_epoch_ms.is_none() {
                        r.released_at_epoch_ms = Some(*released_at_epoch_ms);
                    }
                }
            }

            Event::ReservationReleasedAll {
                ids,
                released_at_epoch_ms,
                actor: _,
            } => {
                for id in ids {
                    if let Some(r) = self.reservations.get_mut(id) {
                        if r.released_at_epoch_ms.is_none() {
                            r.released_at_epoch_ms = Some(*released_at_epoch_ms);
                        }
                    }
                }
            }

            Event::ReservationReleasedForAgent {
                ids,
                released_at_epoch_ms,
                target_agent: _,
                actor: _,
            } => {
                for id in ids {
                    if let Some(r) = self.reservations.get_mut(id) {
                        if r.released_at_epoch_ms.is_none() {
                            r.released_at_epoch_ms = Some(*released_at_epoch_ms);
                        }
                    }
                }
            }

            Event::FileConflict { .. } => {
                // Advisory-only; recorded in the WAL tail, not a projection row.
            }

            Event::CellCreated {
                id,
                cell_type,
                title,
                description,
                priority,
                parent_id,
                created_at_epoch_ms,
            } => {
                self.cells.entry(id.clone()).or_insert_with(|| Cell {
                    id: id.clone(),
                    cell_type: *cell_type,
                    status: CellStatus::Open,
                    title: title.clone(),
                    description: description.clone(),
                    priority: *priority,
                    parent_id: parent_id.clone(),
                    assignee: None,
                    created_at_epoch_ms: *created_at_epoch_ms,
                    updated_at_epoch_ms: *created_at_epoch_ms,
                    closed_at_epoch_ms: None,
                    closed_reason: None,
                    tombstoned_at_epoch_ms: None,
                    labels: Vec::new(),
                    children: Vec::new(),
                });
                if let Some(parent) = parent_id {
                    if let Some(parent_cell) = self.cells.get_mut(parent) {
                        if !parent_cell.children.contains(id) {
                            parent_cell.children.push(id.clone());
                        }
                    }
                }
            }

            Event::CellUpdated {
                id,
                title,
                description,
                priority,
                updated_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    if let Some(t) = title {
                        cell.title = t.clone();
                    }
                    if let Some(d) = description {
                        cell.description = d.clone();
                    }
                    if let Some(p) = priority {
                        cell.priority = *p;
                    }
                    cell.updated_at_epoch_ms = *updated_at_epoch_ms;
                }
            }

            Event::CellStatusChanged {
                id,
                from: _,
                to,
                changed_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.status = *to;
                    cell.updated_at_epoch_ms = *changed_at_epoch_ms;
                }
            }

            Event::CellClosed {
                id,
                closed_reason,
                closed_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.status = CellStatus::Closed;
                    if cell.closed_at_epoch_ms.is_none() {
                        cell.closed_at_epoch_ms = Some(*closed_at_epoch_ms);
                        cell.closed_reason = Some(closed_reason.clone());
                    }
                    cell.updated_at_epoch_ms = *closed_at_epoch_ms;
                }
            }

            Event::CellReopened {
                id,
                reopened_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.status = CellStatus::Open;
                    cell.closed_at_epoch_ms = None;
                    cell.closed_reason = None;
                    cell.updated_at_epoch_ms = *reopened_at_epoch_ms;
                }
            }

            Event::CellDeleted {
                id,
                tombstoned_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    if cell.tombstoned_at_epoch_ms.is_none() {
                        cell.tombstoned_at_epoch_ms = Some(*tombstoned_at_epoch_ms);
                    }
                }
            }

            Event::CellDependencyAdded {
                cell_id,
                depends_on_id,
                relationship,
            } => {
                let dep = CellDependency {
                    cell_id: cell_id.clone(),
                    depends_on_id: depends_on_id.clone(),
                    relationship: relationship.clone(),
                };
                if !self.cell_dependencies.contains(&dep) {
                    self.cell_dependencies.push(dep);
                }
            }

            Event::CellDependencyRemoved {
                cell_id,
                depends_on_id,
            } => {
                self.cell_dependencies
                    .retain(|d| !(&d.cell_id == cell_id && &d.depends_on_id == depends_on_id));
            }

            Event::CellLabelAdded { id, label } => {
                let labels = self.cell_labels.entry(id.clone()).or_default();
                if !labels.iter().any(|l| l == label) {
                    labels.push(label.clone());
                }
                if let Some(cell) = self.cells.get_mut(id) {
                    if !cell.labels.iter().any(|l| l == label) {
                        cell.labels.push(label.clone());
                    }
                }
            }

            Event::CellLabelRemoved { id, label } => {
                if let Some(labels) = self.cell_labels.get_mut(id) {
                    labels.retain(|l| l != label);
                }
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.labels.retain(|l| l != label);
                }
            }

            Event::CellCommentAdded {
                id,
                author,
                body,
                created_at_epoch_ms,
            } => {
                self.cell_comments.push(CellCommentRow {
                    cell_id: id.clone(),
                    author: author.clone(),
                    body: body.clone(),
                    created_at_epoch_ms: *created_at_epoch_ms,
                });
            }

            Event::CellEpicChildAdded { epic_id, child_id } => {
                if let Some(epic) = self.cells.get_mut(epic_id) {
                    if !epic.children.contains(child_id) {
                        epic.children.push(child_id.clone());
                    }
                }
                if let Some(child) = self.cells.get_mut(child_id) {
                    child.parent_id = Some(epic_id.clone());
                }
            }

            Event::CellEpicClosureEligible { .. } => {
                // Advisory signal only; no projection row to update.
            }

            Event::CellAssigned {
                id,
                assignee,
                assigned_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.assignee = Some(assignee.clone());
                    cell.updated_at_epoch_ms = *assigned_at_epoch_ms;
                }
            }

            Event::CellWorkStarted {
                id,
                worker_id,
                started_at_epoch_ms,
            } => {
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.status = CellStatus::InProgress;
                    cell.updated_at_epoch_ms = *started_at_epoch_ms;
                }
                let worker = self.workers.entry(worker_id.clone()).or_insert_with(|| WorkerRecord {
                    id: worker_id.clone(),
                    agent_name: String::new(),
                    cell_id: id.clone(),
                    session_handle: None,
                    phase: WorkerPhase::Spawned,
                    attempt: 0,
                    spawned_at_epoch_ms: *started_at_epoch_ms,
                });
                worker.cell_id = id.clone();
                worker.phase = WorkerPhase::Working;
            }

            Event::SubtaskOutcome { .. } => {
                // Terminal signal consumed by the worker state machine;
                // cell/worker state is already updated via review_feedback
                // and cell_status_changed.
            }

            Event::ReviewFeedback {
                cell_id: _,
                worker_id,
                verdict,
                attempt,
                ..
            } => {
                if let Some(w) = self.workers.get_mut(worker_id) {
                    w.phase = match verdict {
                        sw_core::ReviewVerdict::Approved => WorkerPhase::Approved,
                        sw_core::ReviewVerdict::NeedsChanges => WorkerPhase::Retry,
                    };
                    w.attempt = *attempt;
                }
            }

            Event::CoordinatorDecision {
                session_id,
                kind,
                subject,
                decided_at_epoch_ms,
            } => {
                self.audit_log.push(CoordinatorAuditRow {
                    session_id: session_id.clone(),
                    kind: format!("{kind:?}"),
                    detail: subject.clone(),
                    at_epoch_ms: *decided_at_epoch_ms,
                });
            }

            Event::CoordinatorViolation {
                session_id,
                guard,
                attempted_operation,
                occurred_at_epoch_ms,
            } => {
                self.audit_log.push(CoordinatorAuditRow {
                    session_id: session_id.clone(),
                    kind: format!("violation:{guard}"),
                    detail: attempted_operation.clone(),
                    at_epoch_ms: *occurred_at_epoch_ms,
                });
            }

            Event::CoordinatorOutcome {
                session_id,
                cells_completed,
                cells_failed,
                finished_at_epoch_ms,
            } => {
                self.audit_log.push(CoordinatorAuditRow {
                    session_id: session_id.clone(),
                    kind: "outcome".to_string(),
                    detail: format!("completed={cells_completed} failed={cells_failed}"),
                    at_epoch_ms: *finished_at_epoch_ms,
                });
            }

            Event::CoordinatorCompaction { .. } => {
                // Audit-only; nothing to fold into a table.
            }

            Event::DeferredCreated {
                id,
                created_at_epoch_ms,
                expires_at_epoch_ms,
            } => {
                self.deferred.entry(id.clone()).or_insert_with(|| Deferred {
                    id: id.clone(),
                    resolved: false,
                    value: None,
                    error: None,
                    created_at_epoch_ms: *created_at_epoch_ms,
                    expires_at_epoch_ms: *expires_at_epoch_ms,
                });
            }

            Event::DeferredResolved {
                id,
                value,
                error,
                resolved_at_epoch_ms: _,
            } => {
                if let Some(d) = self.deferred.get_mut(id) {
                    if !d.resolved {
                        d.resolved = true;
                        d.value = value.clone();
                        d.error = error.clone();
                    }
                }
            }

            Event::EvalRunRecorded {
                eval_name,
                score,
                recorded_at_epoch_ms,
            } => {
                self.eval_runs
                    .entry(eval_name.clone())
                    .or_default()
                    .push(EvalRunRow {
                        score: *score,
                        recorded_at_epoch_ms: *recorded_at_epoch_ms,
                    });
            }

            Event::Custom => {}
        }
    }

    /// Every eval whose latest run scored lower than the one before it.
    /// Analytics read-side query; never mutates state.
    pub fn eval_regressions(&self) -> Vec<Regression> {
        let mut regressions = Vec::new();
        for (eval_name, runs) in &self.eval_runs {
            let Some(last_two) = runs.len().checked_sub(2).map(|start| &runs[start..]) else {
                continue;
            };
            let (previous, current) = (&last_two[0], &last_two[1]);
            if current.score < previous.score {
                let delta = previous.score - current.score;
                let delta_percent = (current.score - previous.score) / previous.score * 100.0;
                regressions.push(Regression {
                    eval_name: eval_name.clone(),
                    previous_score: previous.score,
                    current_score: current.score,
                    delta,
                    delta_percent,
                });
            }
        }
        regressions
    }

    // -- Query helpers -----------------------------------------------------

    pub fn get_cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.get(id).filter(|c| !c.is_tombstoned())
    }

    /// Active reservations whose pattern overlaps `path`, for conflict
    /// reporting on a new reservation request.
    pub fn active_reservation_conflicts(
        &self,
        path_pattern: &str,
        now_epoch_ms: i64,
    ) -> Vec<&Reservation> {
        self.reservations
            .values()
            .filter(|r| r.is_active(now_epoch_ms))
            .filter(|r| sw_core::patterns_overlap(path_pattern, &r.path_pattern))
            .collect()
    }

    /// Header-only inbox view for `agent_name`, most recent first, capped at
    /// `clamp_inbox_limit(limit)`.
    pub fn inbox_for_agent(
        &self,
        agent_name: &str,
        unread_only: bool,
        limit: usize,
    ) -> Vec<InboxEntry> {
        let mut entries: Vec<InboxEntry> = self
            .message_recipients
            .iter()
            .filter_map(|(message_id, recipients)| {
                let recipient = recipients.get(agent_name)?;
                if unread_only && recipient.read_at_epoch_ms.is_some() {
                    return None;
                }
                let message = self.messages.get(message_id)?;
                Some(InboxEntry {
                    id: message.id.clone(),
                    from_agent: message.from_agent.clone(),
                    subject: message.subject.clone(),
                    thread_id: message.thread_id.clone(),
                    importance: message.importance,
                    ack_required: message.ack_required,
                    created_at_epoch_ms: message.created_at_epoch_ms,
                    read_at_epoch_ms: recipient.read_at_epoch_ms,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.created_at_epoch_ms.cmp(&a.created_at_epoch_ms));
        entries.truncate(sw_core::clamp_inbox_limit(limit));
        entries
    }

    /// Messages in a thread, oldest first.
    pub fn thread_messages(&self, thread_id: &ThreadId) -> Vec<&Message> {
        let Some(record) = self.threads.get(thread_id) else {
            return Vec::new();
        };
        record
            .message_ids
            .iter()
            .filter_map(|id| self.messages.get(id))
            .collect()
    }

    /// Computes the same aggregate `emitThreadActivity` reports, straight
    /// from the thread's rollup rather than re-scanning all messages.
    pub fn thread_activity(&self, thread_id: &ThreadId) -> Option<sw_core::ThreadActivity> {
        let record = self.threads.get(thread_id)?;
        Some(sw_core::ThreadActivity {
            thread_id: thread_id.clone(),
            message_count: record.message_ids.len() as u32,
            participant_count: record.participants.len() as u32,
            last_message_agent: record.last_message_agent.clone(),
        })
    }

    /// Recipient rows overdue for ack: `ack_required`, unacked, and older
    /// than `ttl_ms`.
    pub fn overdue_acks(&self, now_epoch_ms: i64, ttl_ms: i64) -> Vec<(&Message, &MessageRecipient)> {
        let mut out = Vec::new();
        for (message_id, recipients) in &self.message_recipients {
            let Some(message) = self.messages.get(message_id) else {
                continue;
            };
            if !message.ack_required {
                continue;
            }
            for recipient in recipients.values() {
                if recipient.acked_at_epoch_ms.is_none()
                    && now_epoch_ms - message.created_at_epoch_ms >= ttl_ms
                {
                    out.push((message, recipient));
                }
            }
        }
        out
    }

    pub fn worker(&self, id: &WorkerId) -> Option<&WorkerRecord> {
        self.workers.get(id)
    }

    pub fn expired_deferred(&self, now_epoch_ms: i64) -> Vec<&Deferred> {
        self.deferred
            .values()
            .filter(|d| d.is_expired(now_epoch_ms))
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
