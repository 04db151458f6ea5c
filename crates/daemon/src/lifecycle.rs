// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup/shutdown: state-directory layout, the exclusive PID lock,
//! and the `Registry` the rest of the daemon dispatches requests through.
//! Unlike the teacher's `Runtime`-era lifecycle, there is no central WAL or
//! snapshot to replay here -- each `Coordinator` in the registry opens (and
//! replays) its own project log lazily on first use.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use fs2::FileExt;
use thiserror::Error;

use crate::registry::Registry;

/// On-disk layout for one daemon instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.lock"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire daemon lock: {0}")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error(transparent)]
    Coordinator(#[from] sw_engine::CoordinatorError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Live daemon state: the held PID lock, the per-project registry, and the
/// config used to construct it.
pub struct DaemonState {
    pub config: Config,
    lock_file: File,
    pub registry: Registry,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub state: DaemonState,
}

/// Acquires the exclusive lock, writes the PID and version markers, and
/// constructs the registry. Leaves socket binding to the caller, which does
/// it last (after every other fallible step has succeeded).
pub fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(&config) {
        Ok(state) => Ok(StartupResult { state }),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let mut lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    lock_file.set_len(0)?;
    write!(lock_file, "{}", std::process::id())?;
    lock_file.flush()?;

    std::fs::write(&config.version_path, crate::protocol::PROTOCOL_VERSION)?;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }

    let registry = Registry::new(config.state_dir.clone());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        registry,
        start_time: Instant::now(),
    })
}

/// Removes the files startup writes before the lock was confirmed held, so
/// a failed startup doesn't leave a stale version/socket behind for the
/// next launch to trip over.
fn cleanup_on_failure(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.version_path);
}

impl DaemonState {
    /// Checkpoints every open project and removes the socket/version
    /// files. The lock itself is released by `Drop` on `lock_file`.
    pub fn shutdown(&self) {
        for coordinator in self.registry.open_projects() {
            if let Err(e) = coordinator.checkpoint_now() {
                tracing::warn!(error = %e, project = coordinator.project_key(), "checkpoint on shutdown failed");
            }
        }
        let _ = std::fs::remove_file(&self.config.socket_path);
        let _ = std::fs::remove_file(&self.config.version_path);
    }
}

/// Reads the PID another instance of the daemon wrote to its lock file, for
/// the "already running" diagnostic the CLI prints on a failed start.
pub fn read_lock_pid(config: &Config) -> Option<u32> {
    std::fs::read_to_string(&config.lock_path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
