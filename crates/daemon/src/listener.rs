// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket request dispatch: one task per connection, routing `Request`
//! variants to the `Registry`-resolved `Coordinator` and writing back a
//! `Response`. Mirrors the teacher's accept-loop-per-connection shape, with
//! no separate event-bus hop in the middle -- `Coordinator::append` already
//! commits WAL, projection, and broadcast atomically.

use std::sync::Arc;
use std::time::Duration;

use sw_core::{
    CellId, CoordinatorContext, DeferredId, MessageId, ReservationId, ThreadId, WorkerId,
};
use sw_engine::{CoordinatorError, ReserveOptions};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Query, Request, Response};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn serve(
    listener: UnixListener,
    state: Arc<DaemonState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, _) = accepted?;
                let state = Arc::clone(&state);
                let shutdown = Arc::clone(&shutdown);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state, shutdown).await {
                        warn!(error = %e, "connection handler error");
                    }
                });
            }
            _ = shutdown.notified() => return Ok(()),
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    state: Arc<DaemonState>,
    shutdown: Arc<Notify>,
) -> Result<(), protocol::ProtocolError> {
    let (mut reader, mut writer) = stream.split();
    loop {
        let request = match protocol::read_request(&mut reader, REQUEST_TIMEOUT).await {
            Ok(r) => r,
            Err(protocol::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        let is_shutdown = matches!(request, Request::Shutdown { .. });
        let response = dispatch(&request, &state).await;
        let shutting_down = is_shutdown && matches!(response, Response::ShuttingDown);
        protocol::write_response(&mut writer, &response, REQUEST_TIMEOUT).await?;
        if shutting_down {
            shutdown.notify_waiters();
            return Ok(());
        }
    }
}

async fn dispatch(request: &Request, state: &DaemonState) -> Response {
    match try_dispatch(request, state).await {
        Ok(response) => response,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

async fn try_dispatch(request: &Request, state: &DaemonState) -> Result<Response, CoordinatorError> {
    match request {
        Request::Hello { .. } => Ok(Response::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        }),
        Request::Status => Ok(Response::Status {
            uptime_secs: state.start_time.elapsed().as_secs(),
            projects_open: state.registry.open_projects().len(),
        }),
        Request::Shutdown { .. } => {
            info!("shutdown requested");
            Ok(Response::ShuttingDown)
        }

        Request::RegisterAgent {
            project,
            name,
            program,
            model,
            task_description,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord.register_agent(name, program, model, task_description).await?;
            Ok(Response::Ok)
        }

        Request::SendMessage {
            project,
            from_agent,
            to_agents,
            subject,
            body,
            thread_id,
            importance,
            ack_required,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let id = coord
                .send(
                    from_agent,
                    to_agents,
                    subject,
                    body,
                    thread_id.as_deref().map(ThreadId::from),
                    *importance,
                    *ack_required,
                )
                .await?;
            Ok(Response::MessageSent {
                message_id: id.to_string(),
            })
        }
        Request::ReadMessage {
            project,
            message_id,
            agent_name,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let body = coord
                .read_message(&MessageId::from(message_id.as_str()), agent_name)
                .await?;
            Ok(Response::MessageBody { body })
        }
        Request::AckMessage {
            project,
            message_id,
            agent_name,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord.ack(&MessageId::from(message_id.as_str()), agent_name).await?;
            Ok(Response::Ok)
        }
        Request::EmitThreadActivity { project, thread_id } => {
            let coord = state.registry.get_or_open(project)?;
            let activity = coord
                .emit_thread_activity(&ThreadId::from(thread_id.as_str()))
                .await?;
            Ok(Response::ThreadActivity { activity })
        }

        Request::Reserve {
            project,
            agent_name,
            paths,
            exclusive,
            reason,
            ttl_seconds,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let outcome = coord
                .reserve(
                    agent_name,
                    paths,
                    ReserveOptions {
                        exclusive: *exclusive,
                        reason: reason.clone(),
                        ttl_seconds: *ttl_seconds,
                    },
                )
                .await?;
            Ok(Response::Reserved {
                granted: outcome.granted.iter().map(|id| id.to_string()).collect(),
                conflicts: outcome.conflicts,
            })
        }
        Request::Release {
            project,
            agent_name,
            paths,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord.release(agent_name, paths.as_deref()).await?;
            Ok(Response::Ok)
        }
        Request::ReleaseAllForProject { project, actor } => {
            let coord = state.registry.get_or_open(project)?;
            let ctx = CoordinatorContext::single_tenant(actor.clone());
            coord.release_all_for_project(&ctx, actor).await?;
            Ok(Response::Ok)
        }
        Request::ReleaseAllForAgent {
            project,
            actor,
            target_agent,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let ctx = CoordinatorContext::single_tenant(actor.clone());
            coord.release_all_for_agent(&ctx, actor, target_agent).await?;
            Ok(Response::Ok)
        }

        Request::CreateCell {
            project,
            id,
            cell_type,
            title,
            description,
            priority,
            parent_id,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let id = coord
                .create_cell(
                    CellId::from(id.as_str()),
                    *cell_type,
                    title,
                    description,
                    *priority,
                    parent_id.as_deref().map(CellId::from),
                )
                .await?;
            Ok(Response::CellCreated { id: id.to_string() })
        }
        Request::UpdateCell {
            project,
            id,
            title,
            description,
            priority,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .update_cell(&CellId::from(id.as_str()), title.clone(), description.clone(), *priority)
                .await?;
            Ok(Response::Ok)
        }
        Request::ChangeCellStatus { project, id, to } => {
            let coord = state.registry.get_or_open(project)?;
            coord.change_status(&CellId::from(id.as_str()), *to).await?;
            Ok(Response::Ok)
        }
        Request::CloseCell { project, id, reason } => {
            let coord = state.registry.get_or_open(project)?;
            coord.close_cell(&CellId::from(id.as_str()), reason).await?;
            Ok(Response::Ok)
        }
        Request::ReopenCell { project, id } => {
            let coord = state.registry.get_or_open(project)?;
            coord.reopen_cell(&CellId::from(id.as_str())).await?;
            Ok(Response::Ok)
        }
        Request::DeleteCell { project, id } => {
            let coord = state.registry.get_or_open(project)?;
            coord.delete_cell(&CellId::from(id.as_str())).await?;
            Ok(Response::Ok)
        }
        Request::AddDependency {
            project,
            cell_id,
            depends_on_id,
            relationship,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .add_dependency(
                    &CellId::from(cell_id.as_str()),
                    &CellId::from(depends_on_id.as_str()),
                    *relationship,
                )
                .await?;
            Ok(Response::Ok)
        }
        Request::RemoveDependency {
            project,
            cell_id,
            depends_on_id,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .remove_dependency(&CellId::from(cell_id.as_str()), &CellId::from(depends_on_id.as_str()))
                .await?;
            Ok(Response::Ok)
        }
        Request::AddLabel { project, id, label } => {
            let coord = state.registry.get_or_open(project)?;
            coord.add_label(&CellId::from(id.as_str()), label).await?;
            Ok(Response::Ok)
        }
        Request::RemoveLabel { project, id, label } => {
            let coord = state.registry.get_or_open(project)?;
            coord.remove_label(&CellId::from(id.as_str()), label).await?;
            Ok(Response::Ok)
        }
        Request::AddComment {
            project,
            id,
            author,
            body,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord.add_comment(&CellId::from(id.as_str()), author, body).await?;
            Ok(Response::Ok)
        }
        Request::AddEpicChild {
            project,
            epic_id,
            child_id,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .add_epic_child(&CellId::from(epic_id.as_str()), &CellId::from(child_id.as_str()))
                .await?;
            Ok(Response::Ok)
        }
        Request::AssignCell { project, id, assignee } => {
            let coord = state.registry.get_or_open(project)?;
            coord.assign_cell(&CellId::from(id.as_str()), assignee).await?;
            Ok(Response::Ok)
        }

        Request::SpawnSubtask {
            project,
            cell_id,
            original_prompt,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let (worker_id, prompt) = coord.spawn_subtask(&CellId::from(cell_id.as_str()), original_prompt);
            Ok(Response::SubtaskSpawned {
                worker_id: worker_id.to_string(),
                prompt: prompt.original_prompt,
            })
        }
        Request::WorkerBeginWork {
            project,
            worker_id,
            cell_id,
            agent_name,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .worker_begin_work(&WorkerId::from(worker_id.as_str()), &CellId::from(cell_id.as_str()), agent_name)
                .await?;
            Ok(Response::Ok)
        }
        Request::RecordReviewFeedback {
            project,
            cell_id,
            worker_id,
            verdict,
            issues,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let retry = coord
                .record_review_feedback(
                    &CellId::from(cell_id.as_str()),
                    &WorkerId::from(worker_id.as_str()),
                    *verdict,
                    issues.clone(),
                )
                .await?;
            Ok(Response::ReviewFeedbackRecorded { retry })
        }
        Request::CompleteSubtask {
            project,
            worker_id,
            agent_name,
            duration_ms,
            deferred_id,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let deferred_id = deferred_id.as_deref().map(DeferredId::from);
            let outcome = coord
                .complete_subtask(&WorkerId::from(worker_id.as_str()), agent_name, *duration_ms, deferred_id.as_ref())
                .await?;
            Ok(Response::SubtaskCompleted {
                success: outcome.success,
                duration_ms: outcome.duration_ms,
            })
        }
        Request::FailSubtask {
            project,
            worker_id,
            agent_name,
            duration_ms,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let outcome = coord
                .fail_subtask(&WorkerId::from(worker_id.as_str()), agent_name, *duration_ms)
                .await?;
            Ok(Response::SubtaskCompleted {
                success: outcome.success,
                duration_ms: outcome.duration_ms,
            })
        }

        Request::CreateDeferred { project, ttl_seconds } => {
            let coord = state.registry.get_or_open(project)?;
            let id = coord.create_deferred(*ttl_seconds).await?;
            Ok(Response::DeferredCreated { id: id.to_string() })
        }
        Request::ResolveDeferred {
            project,
            id,
            value,
            error,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord
                .resolve_deferred(&DeferredId::from(id.as_str()), value.clone(), error.clone())
                .await?;
            Ok(Response::Ok)
        }
        Request::AwaitDeferred {
            project,
            id,
            timeout_seconds,
        } => {
            let coord = state.registry.get_or_open(project)?;
            let outcome = coord
                .await_deferred(&DeferredId::from(id.as_str()), *timeout_seconds)
                .await?;
            Ok(Response::DeferredAwaited { outcome })
        }

        Request::RecordEvalRun {
            project,
            eval_name,
            score,
        } => {
            let coord = state.registry.get_or_open(project)?;
            coord.record_eval_run(eval_name, *score).await?;
            Ok(Response::EvalRunRecorded)
        }

        Request::Query { project, query } => dispatch_query(project, query, state).await,
    }
}

async fn dispatch_query(
    project: &str,
    query: &Query,
    state: &DaemonState,
) -> Result<Response, CoordinatorError> {
    let coord = state.registry.get_or_open(project)?;
    match query {
        Query::ListCells => {
            let cells = coord.with_state(|s| s.cells.values().filter(|c| !c.is_tombstoned()).cloned().collect());
            Ok(Response::Cells { cells })
        }
        Query::GetCell { id } => {
            let cell = coord.with_state(|s| s.get_cell(&CellId::from(id.as_str())).cloned());
            Ok(Response::Cell { cell: cell.map(Box::new) })
        }
        Query::ListAgents => {
            let agents = coord.with_state(|s| s.agents.values().cloned().collect());
            Ok(Response::Agents { agents })
        }
        Query::GetAgent { name } => {
            let agents = coord.with_state(|s| s.agents.get(name).cloned().into_iter().collect());
            Ok(Response::Agents { agents })
        }
        Query::Inbox {
            agent,
            limit,
            urgent_only,
        } => {
            let entries = coord.inbox(agent, *limit, *urgent_only);
            Ok(Response::Inbox { entries })
        }
        Query::ActiveReservations { agent } => {
            let reservations = coord.active_reservations(agent.as_deref());
            Ok(Response::Reservations { reservations })
        }
        Query::ListProjects => {
            let projects = state
                .registry
                .open_projects()
                .iter()
                .map(|c| c.project_key().to_string())
                .collect();
            Ok(Response::Projects { projects })
        }
        Query::Log { since_seq, limit } => {
            let entries = coord.entries_after(since_seq.unwrap_or(0))?;
            let entries = entries.into_iter().take(*limit).collect();
            Ok(Response::LogEntries { entries })
        }
        Query::EvalRegressions => {
            let regressions = coord.eval_regressions();
            Ok(Response::EvalRegressions { regressions })
        }
    }
}

#[allow(dead_code)]
fn log_unreachable_reservation_id(id: &ReservationId) {
    error!(%id, "unreachable reservation reference");
}
