// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live Fan-out Server: a read-only HTTP surface over the coordination
//! log, for dashboards and other out-of-process observers that don't speak
//! the Unix-socket wire protocol. Every route is backed by
//! [`sw_engine::Coordinator::subscribe`] / `entries_after` / `with_state`,
//! never by a second copy of the projections.
//!
//! Grounded on the wider pack's `axum` HTTP/WS/SSE surface (`tandem-server`'s
//! `http.rs`): a backlog-then-live producer task feeding a channel that is
//! wrapped as the response stream, so SSE/WS handlers never hold the
//! coordinator's state lock across an await.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sw_core::CellId;
use sw_engine::SequencedEvent;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::CorsLayer;

use crate::registry::Registry;

/// Project key used when a route is asked for a default project (no
/// `{project}` path segment and no `?project=` query parameter).
const DEFAULT_PROJECT: &str = "default";

/// Heartbeat cadence for both the SSE keep-alive comment and the WS
/// `{"type":"heartbeat"}` frame.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Backpressure buffer between the backlog/live producer task and the
/// response stream consumer.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/streams/{project}", get(stream_project))
        .route("/events", get(events_alias))
        .route("/ws", get(ws_upgrade))
        .route("/cells", get(cells_tree))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the fan-out HTTP surface until `shutdown` is notified.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "fan-out server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.notified().await })
        .await
}

#[derive(Debug, Deserialize, Default)]
struct StreamQuery {
    #[serde(default)]
    offset: u64,
    #[serde(default)]
    live: bool,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectQuery {
    project: Option<String>,
    #[serde(default)]
    offset: u64,
}

async fn stream_project(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<axum::response::Response, StatusCode> {
    let coord = state
        .registry
        .get_or_open(&project)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if query.live {
        let rx = spawn_producer(coord.subscribe(), coord.entries_after(query.offset).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?);
        return Ok(Sse::new(ReceiverStream::new(rx))
            .keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL))
            .into_response());
    }

    let mut backlog = coord
        .entries_after(query.offset)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if let Some(limit) = query.limit {
        backlog.truncate(limit);
    }
    Ok(Json(backlog).into_response())
}

async fn events_alias(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> Result<Sse<ReceiverStream<Result<SseEvent, std::convert::Infallible>>>, StatusCode> {
    let project = query.project.as_deref().unwrap_or(DEFAULT_PROJECT);
    let coord = state
        .registry
        .get_or_open(project)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let backlog = coord
        .entries_after(query.offset)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let rx = spawn_producer(coord.subscribe(), backlog);
    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL)))
}

/// Spawn the backlog-then-live task and return the receiving half of its
/// channel, wrapped for the caller to turn into a `Stream`.
fn spawn_producer(
    mut live_rx: broadcast::Receiver<SequencedEvent>,
    backlog: Vec<SequencedEvent>,
) -> mpsc::Receiver<Result<SseEvent, std::convert::Infallible>> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        let mut last_seq = 0;
        for entry in backlog {
            last_seq = entry.seq;
            if tx.send(Ok(sequenced_to_sse(&entry))).await.is_err() {
                return;
            }
        }
        loop {
            match live_rx.recv().await {
                Ok(entry) => {
                    if entry.seq <= last_seq {
                        continue;
                    }
                    last_seq = entry.seq;
                    if tx.send(Ok(sequenced_to_sse(&entry))).await.is_err() {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    });
    rx
}

fn sequenced_to_sse(entry: &SequencedEvent) -> SseEvent {
    SseEvent::default()
        .id(entry.seq.to_string())
        .data(serde_json::to_string(entry).unwrap_or_default())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_stream(socket, state))
}

#[derive(Debug, Deserialize)]
struct WsSubscribe {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    offset: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsFrame<'a> {
    Event { seq: u64, event: &'a sw_core::Event },
    Heartbeat { timestamp: i64 },
    Pong,
}

async fn ws_stream(mut socket: WebSocket, state: AppState) {
    let subscribe = match tokio::time::timeout(Duration::from_secs(5), socket.recv()).await {
        Ok(Some(Ok(WsMessage::Text(text)))) => {
            serde_json::from_str::<WsSubscribe>(&text).unwrap_or(WsSubscribe { project: None, offset: 0 })
        }
        _ => WsSubscribe { project: None, offset: 0 },
    };
    let project = subscribe.project.as_deref().unwrap_or(DEFAULT_PROJECT);
    let coord = match state.registry.get_or_open(project) {
        Ok(coord) => coord,
        Err(err) => {
            let _ = socket
                .send(WsMessage::Text(
                    serde_json::json!({"type": "error", "message": err.to_string()}).to_string().into(),
                ))
                .await;
            return;
        }
    };
    let backlog = match coord.entries_after(subscribe.offset) {
        Ok(backlog) => backlog,
        Err(_) => Vec::new(),
    };
    let mut live_rx = coord.subscribe();
    let mut last_seq = subscribe.offset;

    for entry in &backlog {
        last_seq = entry.seq;
        let frame = WsFrame::Event { seq: entry.seq, event: &entry.event };
        if socket
            .send(WsMessage::Text(serde_json::to_string(&frame).unwrap_or_default().into()))
            .await
            .is_err()
        {
            return;
        }
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick fires immediately; discard it

    loop {
        tokio::select! {
            biased;
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if text.trim() == r#"{"type":"ping"}"# || text.contains("\"ping\"") {
                            let frame = WsFrame::Pong;
                            if socket.send(WsMessage::Text(serde_json::to_string(&frame).unwrap_or_default().into())).await.is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return,
                    Some(Err(_)) => return,
                    _ => {}
                }
            }
            live = live_rx.recv() => {
                match live {
                    Ok(entry) => {
                        if entry.seq <= last_seq {
                            continue;
                        }
                        last_seq = entry.seq;
                        let frame = WsFrame::Event { seq: entry.seq, event: &entry.event };
                        if socket.send(WsMessage::Text(serde_json::to_string(&frame).unwrap_or_default().into())).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
            _ = heartbeat.tick() => {
                let frame = WsFrame::Heartbeat { timestamp: chrono::Utc::now().timestamp_millis() };
                if socket.send(WsMessage::Text(serde_json::to_string(&frame).unwrap_or_default().into())).await.is_err() {
                    return;
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct CellNode {
    id: CellId,
    title: String,
    status: String,
    cell_type: String,
    children: Vec<CellNode>,
}

#[derive(Debug, Deserialize, Default)]
struct CellsQuery {
    project: Option<String>,
}

async fn cells_tree(
    State(state): State<AppState>,
    Query(query): Query<CellsQuery>,
) -> Result<Json<Vec<CellNode>>, StatusCode> {
    let project = query.project.as_deref().unwrap_or(DEFAULT_PROJECT);
    let coord = state
        .registry
        .get_or_open(project)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let tree = coord.with_state(|state| {
        state
            .cells
            .values()
            .filter(|cell| cell.parent_id.is_none() && !cell.is_tombstoned())
            .map(|cell| build_cell_node(cell, state))
            .collect::<Vec<_>>()
    });
    Ok(Json(tree))
}

fn build_cell_node(cell: &sw_core::Cell, state: &sw_storage::MaterializedState) -> CellNode {
    CellNode {
        id: cell.id.clone(),
        title: cell.title.clone(),
        status: format!("{:?}", cell.status),
        cell_type: format!("{:?}", cell.cell_type),
        children: cell
            .children
            .iter()
            .filter_map(|id| state.get_cell(id))
            .filter(|child| !child.is_tombstoned())
            .map(|child| build_cell_node(child, state))
            .collect(),
    }
}
