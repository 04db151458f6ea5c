// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! swarmd: background daemon that owns the coordination log for every
//! open project and serves it over a Unix socket (the primary wire
//! protocol) and an HTTP/WS/SSE fan-out surface (read-only observers).
//!
//! Unlike the teacher's single global event loop, there is no WAL to drain
//! here: each `Coordinator` commits WAL-append, projection-update, and
//! broadcast together inside its own call, so this binary's job is just
//! lifecycle (lock, sockets, signals) and periodic checkpointing.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod http;
mod lifecycle;
mod listener;
mod protocol;
mod registry;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("swarmd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("swarmd {}", env!("CARGO_PKG_VERSION"));
                println!(
                    "Multi-agent coordination daemon - owns the coordination log and serves it"
                );
                println!();
                println!("USAGE:");
                println!("    swarmd");
                println!();
                println!("The daemon is typically started by the `swarm` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for commands from");
                println!("`swarm`, and on an HTTP port for read-only live fan-out clients.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: swarmd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("starting swarmd");

    let StartupResult { state } = match lifecycle::startup(config.clone()) {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = lifecycle::read_lock_pid(&config)
                .map(|p| p.to_string())
                .unwrap_or_default();
            eprintln!("swarmd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let unix_listener = match UnixListener::bind(&state.config.socket_path) {
        Ok(l) => l,
        Err(e) => {
            let err = LifecycleError::BindFailed(state.config.socket_path.clone(), e);
            write_startup_error(&config, &err);
            error!("failed to bind socket: {}", err);
            drop(log_guard);
            return Err(err.into());
        }
    };

    let state = Arc::new(state);
    let shutdown_notify = Arc::new(Notify::new());

    let socket_listener = tokio::spawn(listener::serve(
        unix_listener,
        Arc::clone(&state),
        Arc::clone(&shutdown_notify),
    ));

    let http_addr = ([0, 0, 0, 0], crate::env::http_port()).into();
    let http_state = http::AppState::new(state.registry.clone());
    let http_shutdown = Arc::clone(&shutdown_notify);
    let http_server = tokio::spawn(async move {
        if let Err(e) = http::serve(http_addr, http_state, http_shutdown).await {
            error!("fan-out server error: {}", e);
        }
    });

    spawn_checkpoint_task(Arc::clone(&state), Arc::clone(&shutdown_notify));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        "daemon ready, listening on {} and port {}",
        state.config.socket_path.display(),
        crate::env::http_port()
    );
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => {
            info!("shutdown requested via command");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down...");
            shutdown_notify.notify_waiters();
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down...");
            shutdown_notify.notify_waiters();
        }
    }

    let _ = socket_listener.await;
    http_server.abort();
    state.shutdown();
    info!("daemon stopped");
    Ok(())
}

/// Checkpoint interval for the time-based background sweep; `Coordinator`
/// also checkpoints automatically every 500 appended events, so this only
/// matters for low-traffic projects that would otherwise never trip that
/// counter.
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

fn spawn_checkpoint_task(state: Arc<lifecycle::DaemonState>, shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CHECKPOINT_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for coordinator in state.registry.open_projects() {
                        if let Err(e) = coordinator.checkpoint_now() {
                            tracing::warn!(error = %e, project = coordinator.project_key(), "periodic checkpoint failed");
                        }
                    }
                }
                _ = shutdown.notified() => return,
            }
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` -> `daemon.log.1` -> `daemon.log.2` -> `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to log before anything else. The CLI uses
/// this to find where the current startup attempt begins.
/// Full format: "--- swarmd: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- swarmd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(
        file,
        "{}{}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id()
    )?;

    Ok(())
}

fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
