// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. Every
//! coordinator-scoped request carries the `project` key the daemon uses to
//! resolve a `Registry`-held `Coordinator` (Design Notes §2: projects never
//! share a log).

use sw_core::{
    Agent, AwaitOutcome, Cell, CellStatus, CellType, DependencyRelationship, Importance,
    InboxEntry, Reservation, ReservationConflict, RetryContext, ReviewVerdict,
};
use sw_engine::SequencedEvent;
use serde::{Deserialize, Serialize};

/// Request from CLI to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Version handshake.
    Hello { version: String },

    /// Daemon uptime and open-project count.
    Status,

    /// Request daemon shutdown.
    Shutdown {
        #[serde(default)]
        kill: bool,
    },

    RegisterAgent {
        project: String,
        name: String,
        program: String,
        model: String,
        task_description: String,
    },

    SendMessage {
        project: String,
        from_agent: String,
        to_agents: Vec<String>,
        subject: String,
        body: String,
        #[serde(default)]
        thread_id: Option<String>,
        importance: Importance,
        ack_required: bool,
    },
    ReadMessage {
        project: String,
        message_id: String,
        agent_name: String,
    },
    AckMessage {
        project: String,
        message_id: String,
        agent_name: String,
    },
    EmitThreadActivity {
        project: String,
        thread_id: String,
    },

    Reserve {
        project: String,
        agent_name: String,
        paths: Vec<String>,
        #[serde(default = "default_exclusive")]
        exclusive: bool,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        ttl_seconds: Option<i64>,
    },
    Release {
        project: String,
        agent_name: String,
        #[serde(default)]
        paths: Option<Vec<String>>,
    },
    ReleaseAllForProject {
        project: String,
        actor: String,
    },
    ReleaseAllForAgent {
        project: String,
        actor: String,
        target_agent: String,
    },

    CreateCell {
        project: String,
        id: String,
        cell_type: CellType,
        title: String,
        description: String,
        #[serde(default)]
        priority: u8,
        #[serde(default)]
        parent_id: Option<String>,
    },
    UpdateCell {
        project: String,
        id: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        priority: Option<u8>,
    },
    ChangeCellStatus {
        project: String,
        id: String,
        to: CellStatus,
    },
    CloseCell {
        project: String,
        id: String,
        reason: String,
    },
    ReopenCell {
        project: String,
        id: String,
    },
    DeleteCell {
        project: String,
        id: String,
    },
    AddDependency {
        project: String,
        cell_id: String,
        depends_on_id: String,
        relationship: DependencyRelationship,
    },
    RemoveDependency {
        project: String,
        cell_id: String,
        depends_on_id: String,
    },
    AddLabel {
        project: String,
        id: String,
        label: String,
    },
    RemoveLabel {
        project: String,
        id: String,
        label: String,
    },
    AddComment {
        project: String,
        id: String,
        author: String,
        body: String,
    },
    AddEpicChild {
        project: String,
        epic_id: String,
        child_id: String,
    },
    AssignCell {
        project: String,
        id: String,
        assignee: String,
    },

    SpawnSubtask {
        project: String,
        cell_id: String,
        original_prompt: String,
    },
    WorkerBeginWork {
        project: String,
        worker_id: String,
        cell_id: String,
        agent_name: String,
    },
    RecordReviewFeedback {
        project: String,
        cell_id: String,
        worker_id: String,
        verdict: ReviewVerdict,
        #[serde(default)]
        issues: Vec<String>,
    },
    CompleteSubtask {
        project: String,
        worker_id: String,
        agent_name: String,
        duration_ms: i64,
        #[serde(default)]
        deferred_id: Option<String>,
    },
    FailSubtask {
        project: String,
        worker_id: String,
        agent_name: String,
        duration_ms: i64,
    },

    CreateDeferred {
        project: String,
        ttl_seconds: i64,
    },
    ResolveDeferred {
        project: String,
        id: String,
        #[serde(default)]
        value: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<String>,
    },
    AwaitDeferred {
        project: String,
        id: String,
        timeout_seconds: i64,
    },

    RecordEvalRun {
        project: String,
        eval_name: String,
        score: f64,
    },

    Query {
        project: String,
        query: Query,
    },
}

fn default_exclusive() -> bool {
    true
}

/// Read-only queries, dispatched without touching the WAL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Query {
    ListCells,
    GetCell {
        id: String,
    },
    ListAgents,
    GetAgent {
        name: String,
    },
    Inbox {
        agent: String,
        #[serde(default = "default_inbox_limit")]
        limit: usize,
        #[serde(default)]
        urgent_only: bool,
    },
    ActiveReservations {
        #[serde(default)]
        agent: Option<String>,
    },
    ListProjects,
    EvalRegressions,
    /// Tails the project's event log starting after `since_seq` (`None`
    /// means "from the beginning"), capped at `limit` entries.
    Log {
        #[serde(default)]
        since_seq: Option<u64>,
        #[serde(default = "default_log_limit")]
        limit: usize,
    },
}

fn default_inbox_limit() -> usize {
    5
}

fn default_log_limit() -> usize {
    100
}

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    ShuttingDown,
    Error {
        message: String,
    },

    Hello {
        version: String,
    },
    Status {
        uptime_secs: u64,
        projects_open: usize,
    },

    MessageSent {
        message_id: String,
    },
    MessageBody {
        body: String,
    },
    ThreadActivity {
        activity: sw_core::ThreadActivity,
    },

    Reserved {
        granted: Vec<String>,
        conflicts: Vec<ReservationConflict>,
    },
    Reservations {
        reservations: Vec<Reservation>,
    },

    CellCreated {
        id: String,
    },
    Cell {
        cell: Option<Box<Cell>>,
    },
    Cells {
        cells: Vec<Cell>,
    },

    Agents {
        agents: Vec<Agent>,
    },
    Inbox {
        entries: Vec<InboxEntry>,
    },
    Projects {
        projects: Vec<String>,
    },
    LogEntries {
        entries: Vec<SequencedEvent>,
    },

    SubtaskSpawned {
        worker_id: String,
        prompt: String,
    },
    ReviewFeedbackRecorded {
        retry: Option<RetryContext>,
    },
    SubtaskCompleted {
        success: bool,
        duration_ms: i64,
    },

    DeferredCreated {
        id: String,
    },
    DeferredAwaited {
        outcome: AwaitOutcome,
    },

    EvalRunRecorded,
    EvalRegressions {
        regressions: Vec<sw_storage::Regression>,
    },
}

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
