// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process record and the subtask prompt it was spawned with.
//!
//! Supplemented entities (see SPEC_FULL.md §3.1): mirrors this codebase's
//! `WorkerRecord`/`AgentRecord` pair so a crashed coordinator can
//! reconcile which workers were mid-flight on restart.

use crate::{CellId, WorkerId};
use serde::{Deserialize, Serialize};

/// Worker lifecycle states. The state a worker is "in" is the combination
/// of its cell's status plus the review status reconstructed from
/// `review_feedback` events; this enum names the coarse phase for display
/// and reconciliation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    Spawned,
    Reserving,
    Working,
    Verifying,
    UnderReview,
    Retry,
    Approved,
    Completed,
    Failed,
    Blocked,
}

/// `(worker_name, agent_name, subtask cell id, session handle, status)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub agent_name: String,
    pub cell_id: CellId,
    pub session_handle: Option<String>,
    pub phase: WorkerPhase,
    pub attempt: u32,
    pub spawned_at_epoch_ms: i64,
}

/// The generated prompt text and replay-issues list kept alongside a cell
/// so a `retry_context.next_action = "spawn_retry"` can be replayed
/// verbatim on the next attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtaskPrompt {
    pub cell_id: CellId,
    pub original_prompt: String,
    pub replay_issues: Vec<String>,
}

/// What the coordinator should do after a `needs_changes` review verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryContext {
    pub cell_id: CellId,
    pub attempt: u32,
    pub issues: Vec<String>,
    pub max_attempts: u32,
    pub next_action: String,
}

impl RetryContext {
    pub fn spawn_retry(cell_id: CellId, attempt: u32, issues: Vec<String>) -> Self {
        Self {
            cell_id,
            attempt,
            issues,
            max_attempts: crate::MAX_ATTEMPTS,
            next_action: "spawn_retry".to_string(),
        }
    }
}
