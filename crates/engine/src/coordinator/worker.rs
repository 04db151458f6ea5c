// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle state machine: spawn -> reserve -> work -> verify ->
//! review -> complete / retry / fail. Directly grounded on the teacher's
//! `runtime::handlers::worker::{dispatch, completion, lifecycle, polling}`
//! functions, generalized from queue-backed job dispatch to the
//! reservation-backed subtask flow this substrate coordinates.

use sw_core::{
    CellId, CellStatus, Clock, Event, ReviewVerdict, RetryContext, SubtaskPrompt, WorkerId,
    WorkerPhase, MAX_ATTEMPTS,
};

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;

/// Outcome of `complete`: either the cell closed and any associated
/// deferred resolved, or the gate refused because the worker was not
/// approved.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub success: bool,
    pub duration_ms: i64,
}

impl<C: Clock> Coordinator<C> {
    /// `spawn_subtask`: generates the worker id and records which cell it
    /// is attached to. The `WorkerRecord` row itself is only durably
    /// created once the worker's first `CellWorkStarted` event lands
    /// (mirrors the teacher's crash-reconciliation, which rebuilds
    /// in-flight worker state by replaying dispatch events rather than a
    /// separate "spawned" table).
    pub fn spawn_subtask(&self, cell_id: &CellId, original_prompt: &str) -> (WorkerId, SubtaskPrompt) {
        let worker_id = WorkerId::new(self.next_id());
        let prompt = SubtaskPrompt {
            cell_id: cell_id.clone(),
            original_prompt: original_prompt.to_string(),
            replay_issues: Vec::new(),
        };
        (worker_id, prompt)
    }

    /// Worker obtained its file locks and has begun the subtask.
    pub async fn worker_begin_work(
        &self,
        worker_id: &WorkerId,
        cell_id: &CellId,
        agent_name: &str,
    ) -> Result<(), CoordinatorError> {
        self.assign_cell(cell_id, agent_name).await?;
        self.start_work(cell_id, worker_id).await?;
        Ok(())
    }

    /// Records a review verdict. `needs_changes` produces a `RetryContext`
    /// the coordinator replays verbatim on the next worker spawn; it never
    /// messages the worker directly, since workers are one-shot processes.
    /// `approved` IS sent as a message (audit trail) by the caller.
    pub async fn record_review_feedback(
        &self,
        cell_id: &CellId,
        worker_id: &WorkerId,
        verdict: ReviewVerdict,
        issues: Vec<String>,
    ) -> Result<Option<RetryContext>, CoordinatorError> {
        let current_attempt = self
            .with_state(|s| s.worker(worker_id).map(|w| w.attempt))
            .unwrap_or(0);

        let (attempt, remaining_attempts) = match verdict {
            ReviewVerdict::Approved => (0, MAX_ATTEMPTS),
            ReviewVerdict::NeedsChanges => {
                let next = current_attempt + 1;
                (next, MAX_ATTEMPTS.saturating_sub(next))
            }
        };

        let now = self.now_epoch_ms();
        self.append(Event::ReviewFeedback {
            cell_id: cell_id.clone(),
            worker_id: worker_id.clone(),
            verdict,
            attempt,
            remaining_attempts,
            issues: issues.clone(),
            reviewed_at_epoch_ms: now,
        })?;

        if matches!(verdict, ReviewVerdict::NeedsChanges) && attempt < MAX_ATTEMPTS {
            return Ok(Some(RetryContext::spawn_retry(cell_id.clone(), attempt, issues)));
        }
        Ok(None)
    }

    /// `complete`: refuses unless the worker's last review was `approved`
    /// (the review gate). On success, releases the worker's reservations,
    /// closes the cell, resolves any Deferred tied to the subtask, and
    /// emits `subtask_outcome`.
    pub async fn complete_subtask(
        &self,
        worker_id: &WorkerId,
        agent_name: &str,
        duration_ms: i64,
        deferred_id: Option<&sw_core::DeferredId>,
    ) -> Result<CompletionOutcome, CoordinatorError> {
        let worker = self
            .with_state(|s| s.worker(worker_id).cloned())
            .ok_or_else(|| CoordinatorError::WorkerNotFound(worker_id.to_string()))?;

        if worker.phase != WorkerPhase::Approved {
            return Err(CoordinatorError::Guard {
                guard: "review_gate".to_string(),
                message: "completion requires an approved review".to_string(),
            });
        }

        self.release(agent_name, None).await?;
        self.close_cell(&worker.cell_id, "completed").await?;

        if let Some(id) = deferred_id {
            self.resolve_deferred(id, Some(serde_json::json!({"success": true})), None)
                .await?;
        }

        self.append(Event::SubtaskOutcome {
            cell_id: worker.cell_id.clone(),
            worker_id: worker_id.clone(),
            success: true,
            duration_ms,
            bead_id: worker.cell_id,
        })?;

        Ok(CompletionOutcome {
            success: true,
            duration_ms,
        })
    }

    /// Terminal failure: attempts exhausted or an unrecoverable blocker.
    /// Releases reservations and marks the cell blocked rather than
    /// closed, since failure is not completion.
    pub async fn fail_subtask(
        &self,
        worker_id: &WorkerId,
        agent_name: &str,
        duration_ms: i64,
    ) -> Result<CompletionOutcome, CoordinatorError> {
        let worker = self
            .with_state(|s| s.worker(worker_id).cloned())
            .ok_or_else(|| CoordinatorError::WorkerNotFound(worker_id.to_string()))?;

        self.release(agent_name, None).await?;
        self.change_status(&worker.cell_id, CellStatus::Blocked).await?;

        self.append(Event::SubtaskOutcome {
            cell_id: worker.cell_id.clone(),
            worker_id: worker_id.clone(),
            success: false,
            duration_ms,
            bead_id: worker.cell_id,
        })?;

        Ok(CompletionOutcome {
            success: false,
            duration_ms,
        })
    }
}
