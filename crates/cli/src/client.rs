// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_dir, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync, wrap_with_startup_error,
};

use sw_core::{
    Agent, AwaitOutcome, Cell, CellStatus, CellType, DependencyRelationship, Importance,
    InboxEntry, Reservation, ReservationConflict, RetryContext, ReviewVerdict, ThreadActivity,
};
use sw_daemon::protocol::{self, ProtocolError};
use sw_daemon::{Query, Request, Response};
use sw_engine::SequencedEvent;
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (hello, status, query, shutdown)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("SWARM_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("SWARM_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("SWARM_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("SWARM_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

/// Daemon client, scoped to one `project` for every coordinator-facing call.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For action commands - auto-start with version check, max 1 restart per process
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For query commands - connect only, no restart
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    /// Internal: connect_or_start with restart limit (max 1 restart per process)
    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }

        let daemon_dir = daemon_dir()?;
        let version_path = daemon_dir.join("daemon.version");
        if let Ok(daemon_version) = std::fs::read_to_string(&version_path) {
            let cli_version = env!("CARGO_PKG_VERSION");
            if daemon_version.trim() != cli_version {
                RESTARTED.store(true, Ordering::SeqCst);
                eprintln!(
                    "warn: daemon version {} does not match cli version {}, restarting daemon",
                    daemon_version.trim(),
                    cli_version
                );
                stop_daemon_sync();
            }
        }

        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Unconditionally connect-or-start, with no per-process restart cap.
    /// Used by `swarm daemon start`/`restart`, where starting the daemon is
    /// the whole point of the call.
    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error() {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {}",
                        status
                    )));
                }
                Ok(None) => {}
                Err(_) => {}
            }

            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        match self
            .send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
        {
            Ok(response) => Ok(response),
            Err(e) => {
                log_connection_error(&e);
                Err(e)
            }
        }
    }

    async fn send_simple(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<(u64, usize), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                projects_open,
            } => Ok((uptime_secs, projects_open)),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self, kill: bool) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown { kill }).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    // --- Agents ---

    pub async fn register_agent(
        &self,
        project: &str,
        name: &str,
        program: &str,
        model: &str,
        task_description: &str,
    ) -> Result<(), ClientError> {
        let request = Request::RegisterAgent {
            project: project.to_string(),
            name: name.to_string(),
            program: program.to_string(),
            model: model.to_string(),
            task_description: task_description.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn list_agents(&self, project: &str) -> Result<Vec<Agent>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::ListAgents,
        };
        match self.send(&request).await? {
            Response::Agents { agents } => Ok(agents),
            other => Self::reject(other),
        }
    }

    pub async fn get_agent(&self, project: &str, name: &str) -> Result<Option<Agent>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::GetAgent { name: name.to_string() },
        };
        match self.send(&request).await? {
            Response::Agents { mut agents } => Ok(agents.pop()),
            other => Self::reject(other),
        }
    }

    // --- Messages ---

    #[allow(clippy::too_many_arguments)]
    pub async fn send_message(
        &self,
        project: &str,
        from_agent: &str,
        to_agents: Vec<String>,
        subject: &str,
        body: &str,
        thread_id: Option<String>,
        importance: Importance,
        ack_required: bool,
    ) -> Result<String, ClientError> {
        let request = Request::SendMessage {
            project: project.to_string(),
            from_agent: from_agent.to_string(),
            to_agents,
            subject: subject.to_string(),
            body: body.to_string(),
            thread_id,
            importance,
            ack_required,
        };
        match self.send(&request).await? {
            Response::MessageSent { message_id } => Ok(message_id),
            other => Self::reject(other),
        }
    }

    pub async fn read_message(
        &self,
        project: &str,
        message_id: &str,
        agent_name: &str,
    ) -> Result<String, ClientError> {
        let request = Request::ReadMessage {
            project: project.to_string(),
            message_id: message_id.to_string(),
            agent_name: agent_name.to_string(),
        };
        match self.send(&request).await? {
            Response::MessageBody { body } => Ok(body),
            other => Self::reject(other),
        }
    }

    pub async fn ack_message(
        &self,
        project: &str,
        message_id: &str,
        agent_name: &str,
    ) -> Result<(), ClientError> {
        let request = Request::AckMessage {
            project: project.to_string(),
            message_id: message_id.to_string(),
            agent_name: agent_name.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn inbox(
        &self,
        project: &str,
        agent: &str,
        limit: usize,
        urgent_only: bool,
    ) -> Result<Vec<InboxEntry>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::Inbox {
                agent: agent.to_string(),
                limit,
                urgent_only,
            },
        };
        match self.send(&request).await? {
            Response::Inbox { entries } => Ok(entries),
            other => Self::reject(other),
        }
    }

    pub async fn emit_thread_activity(
        &self,
        project: &str,
        thread_id: &str,
    ) -> Result<ThreadActivity, ClientError> {
        let request = Request::EmitThreadActivity {
            project: project.to_string(),
            thread_id: thread_id.to_string(),
        };
        match self.send(&request).await? {
            Response::ThreadActivity { activity } => Ok(activity),
            other => Self::reject(other),
        }
    }

    // --- Reservations ---

    #[allow(clippy::too_many_arguments)]
    pub async fn reserve(
        &self,
        project: &str,
        agent_name: &str,
        paths: Vec<String>,
        exclusive: bool,
        reason: Option<String>,
        ttl_seconds: Option<i64>,
    ) -> Result<(Vec<String>, Vec<ReservationConflict>), ClientError> {
        let request = Request::Reserve {
            project: project.to_string(),
            agent_name: agent_name.to_string(),
            paths,
            exclusive,
            reason,
            ttl_seconds,
        };
        match self.send(&request).await? {
            Response::Reserved { granted, conflicts } => Ok((granted, conflicts)),
            other => Self::reject(other),
        }
    }

    pub async fn release(
        &self,
        project: &str,
        agent_name: &str,
        paths: Option<Vec<String>>,
    ) -> Result<(), ClientError> {
        let request = Request::Release {
            project: project.to_string(),
            agent_name: agent_name.to_string(),
            paths,
        };
        self.send_simple(&request).await
    }

    pub async fn release_all_for_project(
        &self,
        project: &str,
        actor: &str,
    ) -> Result<(), ClientError> {
        let request = Request::ReleaseAllForProject {
            project: project.to_string(),
            actor: actor.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn release_all_for_agent(
        &self,
        project: &str,
        actor: &str,
        target_agent: &str,
    ) -> Result<(), ClientError> {
        let request = Request::ReleaseAllForAgent {
            project: project.to_string(),
            actor: actor.to_string(),
            target_agent: target_agent.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn active_reservations(
        &self,
        project: &str,
        agent: Option<String>,
    ) -> Result<Vec<Reservation>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::ActiveReservations { agent },
        };
        match self.send(&request).await? {
            Response::Reservations { reservations } => Ok(reservations),
            other => Self::reject(other),
        }
    }

    // --- Cells ---

    #[allow(clippy::too_many_arguments)]
    pub async fn create_cell(
        &self,
        project: &str,
        id: &str,
        cell_type: CellType,
        title: &str,
        description: &str,
        priority: u8,
        parent_id: Option<String>,
    ) -> Result<String, ClientError> {
        let request = Request::CreateCell {
            project: project.to_string(),
            id: id.to_string(),
            cell_type,
            title: title.to_string(),
            description: description.to_string(),
            priority,
            parent_id,
        };
        match self.send(&request).await? {
            Response::CellCreated { id } => Ok(id),
            other => Self::reject(other),
        }
    }

    pub async fn update_cell(
        &self,
        project: &str,
        id: &str,
        title: Option<String>,
        description: Option<String>,
        priority: Option<u8>,
    ) -> Result<(), ClientError> {
        let request = Request::UpdateCell {
            project: project.to_string(),
            id: id.to_string(),
            title,
            description,
            priority,
        };
        self.send_simple(&request).await
    }

    pub async fn change_cell_status(
        &self,
        project: &str,
        id: &str,
        to: CellStatus,
    ) -> Result<(), ClientError> {
        let request = Request::ChangeCellStatus {
            project: project.to_string(),
            id: id.to_string(),
            to,
        };
        self.send_simple(&request).await
    }

    pub async fn close_cell(&self, project: &str, id: &str, reason: &str) -> Result<(), ClientError> {
        let request = Request::CloseCell {
            project: project.to_string(),
            id: id.to_string(),
            reason: reason.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn reopen_cell(&self, project: &str, id: &str) -> Result<(), ClientError> {
        let request = Request::ReopenCell {
            project: project.to_string(),
            id: id.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn delete_cell(&self, project: &str, id: &str) -> Result<(), ClientError> {
        let request = Request::DeleteCell {
            project: project.to_string(),
            id: id.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn add_dependency(
        &self,
        project: &str,
        cell_id: &str,
        depends_on_id: &str,
        relationship: DependencyRelationship,
    ) -> Result<(), ClientError> {
        let request = Request::AddDependency {
            project: project.to_string(),
            cell_id: cell_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
            relationship,
        };
        self.send_simple(&request).await
    }

    pub async fn remove_dependency(
        &self,
        project: &str,
        cell_id: &str,
        depends_on_id: &str,
    ) -> Result<(), ClientError> {
        let request = Request::RemoveDependency {
            project: project.to_string(),
            cell_id: cell_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn add_label(&self, project: &str, id: &str, label: &str) -> Result<(), ClientError> {
        let request = Request::AddLabel {
            project: project.to_string(),
            id: id.to_string(),
            label: label.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn remove_label(&self, project: &str, id: &str, label: &str) -> Result<(), ClientError> {
        let request = Request::RemoveLabel {
            project: project.to_string(),
            id: id.to_string(),
            label: label.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn add_comment(
        &self,
        project: &str,
        id: &str,
        author: &str,
        body: &str,
    ) -> Result<(), ClientError> {
        let request = Request::AddComment {
            project: project.to_string(),
            id: id.to_string(),
            author: author.to_string(),
            body: body.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn add_epic_child(
        &self,
        project: &str,
        epic_id: &str,
        child_id: &str,
    ) -> Result<(), ClientError> {
        let request = Request::AddEpicChild {
            project: project.to_string(),
            epic_id: epic_id.to_string(),
            child_id: child_id.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn assign_cell(&self, project: &str, id: &str, assignee: &str) -> Result<(), ClientError> {
        let request = Request::AssignCell {
            project: project.to_string(),
            id: id.to_string(),
            assignee: assignee.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn list_cells(&self, project: &str) -> Result<Vec<Cell>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::ListCells,
        };
        match self.send(&request).await? {
            Response::Cells { cells } => Ok(cells),
            other => Self::reject(other),
        }
    }

    pub async fn get_cell(&self, project: &str, id: &str) -> Result<Option<Cell>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::GetCell { id: id.to_string() },
        };
        match self.send(&request).await? {
            Response::Cell { cell } => Ok(cell.map(|c| *c)),
            other => Self::reject(other),
        }
    }

    // --- Worker lifecycle ---

    pub async fn spawn_subtask(
        &self,
        project: &str,
        cell_id: &str,
        original_prompt: &str,
    ) -> Result<(String, String), ClientError> {
        let request = Request::SpawnSubtask {
            project: project.to_string(),
            cell_id: cell_id.to_string(),
            original_prompt: original_prompt.to_string(),
        };
        match self.send(&request).await? {
            Response::SubtaskSpawned { worker_id, prompt } => Ok((worker_id, prompt)),
            other => Self::reject(other),
        }
    }

    pub async fn worker_begin_work(
        &self,
        project: &str,
        worker_id: &str,
        cell_id: &str,
        agent_name: &str,
    ) -> Result<(), ClientError> {
        let request = Request::WorkerBeginWork {
            project: project.to_string(),
            worker_id: worker_id.to_string(),
            cell_id: cell_id.to_string(),
            agent_name: agent_name.to_string(),
        };
        self.send_simple(&request).await
    }

    pub async fn record_review_feedback(
        &self,
        project: &str,
        cell_id: &str,
        worker_id: &str,
        verdict: ReviewVerdict,
        issues: Vec<String>,
    ) -> Result<Option<RetryContext>, ClientError> {
        let request = Request::RecordReviewFeedback {
            project: project.to_string(),
            cell_id: cell_id.to_string(),
            worker_id: worker_id.to_string(),
            verdict,
            issues,
        };
        match self.send(&request).await? {
            Response::ReviewFeedbackRecorded { retry } => Ok(retry),
            other => Self::reject(other),
        }
    }

    pub async fn complete_subtask(
        &self,
        project: &str,
        worker_id: &str,
        agent_name: &str,
        duration_ms: i64,
        deferred_id: Option<String>,
    ) -> Result<(bool, i64), ClientError> {
        let request = Request::CompleteSubtask {
            project: project.to_string(),
            worker_id: worker_id.to_string(),
            agent_name: agent_name.to_string(),
            duration_ms,
            deferred_id,
        };
        match self.send(&request).await? {
            Response::SubtaskCompleted {
                success,
                duration_ms,
            } => Ok((success, duration_ms)),
            other => Self::reject(other),
        }
    }

    pub async fn fail_subtask(
        &self,
        project: &str,
        worker_id: &str,
        agent_name: &str,
        duration_ms: i64,
    ) -> Result<(), ClientError> {
        let request = Request::FailSubtask {
            project: project.to_string(),
            worker_id: worker_id.to_string(),
            agent_name: agent_name.to_string(),
            duration_ms,
        };
        self.send_simple(&request).await
    }

    // --- Durable deferred ---

    pub async fn create_deferred(&self, project: &str, ttl_seconds: i64) -> Result<String, ClientError> {
        let request = Request::CreateDeferred {
            project: project.to_string(),
            ttl_seconds,
        };
        match self.send(&request).await? {
            Response::DeferredCreated { id } => Ok(id),
            other => Self::reject(other),
        }
    }

    pub async fn resolve_deferred(
        &self,
        project: &str,
        id: &str,
        value: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<(), ClientError> {
        let request = Request::ResolveDeferred {
            project: project.to_string(),
            id: id.to_string(),
            value,
            error,
        };
        self.send_simple(&request).await
    }

    pub async fn await_deferred(
        &self,
        project: &str,
        id: &str,
        timeout_seconds: i64,
    ) -> Result<AwaitOutcome, ClientError> {
        let request = Request::AwaitDeferred {
            project: project.to_string(),
            id: id.to_string(),
            timeout_seconds,
        };
        match self.send(&request).await? {
            Response::DeferredAwaited { outcome } => Ok(outcome),
            other => Self::reject(other),
        }
    }

    pub async fn record_eval_run(
        &self,
        project: &str,
        eval_name: &str,
        score: f64,
    ) -> Result<(), ClientError> {
        let request = Request::RecordEvalRun {
            project: project.to_string(),
            eval_name: eval_name.to_string(),
            score,
        };
        self.send_simple(&request).await
    }

    pub async fn eval_regressions(
        &self,
        project: &str,
    ) -> Result<Vec<sw_storage::Regression>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::EvalRegressions,
        };
        match self.send(&request).await? {
            Response::EvalRegressions { regressions } => Ok(regressions),
            other => Self::reject(other),
        }
    }

    // --- Projects & log ---

    pub async fn list_projects(&self) -> Result<Vec<String>, ClientError> {
        // Projects are tracked per-registry, not per-project; the daemon
        // resolves this query against whichever project key is given, so
        // any already-open project works -- "default" if none has opened.
        let request = Request::Query {
            project: crate::env::project().unwrap_or_else(|| "default".to_string()),
            query: Query::ListProjects,
        };
        match self.send(&request).await? {
            Response::Projects { projects } => Ok(projects),
            other => Self::reject(other),
        }
    }

    pub async fn log_entries(
        &self,
        project: &str,
        since_seq: Option<u64>,
        limit: usize,
    ) -> Result<Vec<SequencedEvent>, ClientError> {
        let request = Request::Query {
            project: project.to_string(),
            query: Query::Log { since_seq, limit },
        };
        match self.send(&request).await? {
            Response::LogEntries { entries } => Ok(entries),
            other => Self::reject(other),
        }
    }
}
