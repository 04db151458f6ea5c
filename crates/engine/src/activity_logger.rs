// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified append-only logger for per-entity activity logs.
//!
//! A single parameterized `ActivityLogger<K>` handles both worker and
//! coordinator-session logging, with the subdirectory determined by the
//! `LogKind` marker trait.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::log_paths;
use chrono::Utc;

/// Marker trait for activity log kinds.
pub trait LogKind {
    /// Subdirectory within the logs dir (e.g. "worker", "coordinator").
    const SUBDIR: &'static str;
}

/// Marker type for worker logs.
pub struct WorkerLog;
impl LogKind for WorkerLog {
    const SUBDIR: &'static str = "worker";
}

/// Marker type for coordinator-session audit logs.
pub struct AuditLog;
impl LogKind for AuditLog {
    const SUBDIR: &'static str = "coordinator";
}

/// Unified append-only logger for per-entity activity logs.
///
/// Writes human-readable timestamped lines to `<log_dir>/<subdir>/<id>.log`.
/// Each `append()` opens, writes, and closes the file -- fine for the low
/// write frequency of worker/coordinator activity.
pub struct ActivityLogger<K: LogKind> {
    log_dir: PathBuf,
    _kind: PhantomData<K>,
}

impl<K: LogKind> ActivityLogger<K> {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir,
            _kind: PhantomData,
        }
    }

    fn write_line(&self, path: &Path, label: &str, message: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(file, "{ts} [{label}] {message}")?;
        Ok(())
    }
}

/// Type alias for worker activity logger.
pub type WorkerLogger = ActivityLogger<WorkerLog>;

impl ActivityLogger<WorkerLog> {
    /// Append a log line for the given worker. Failures are logged via
    /// tracing but do not propagate -- logging must not break the engine.
    pub fn append(&self, worker_name: &str, message: &str) {
        let path = log_paths::worker_log_path(&self.log_dir, worker_name);
        if let Err(e) = self.write_line(&path, "worker", message) {
            tracing::warn!(worker_name, error = %e, "failed to write worker log");
        }
    }
}

/// Type alias for coordinator-session audit logger.
pub type AuditLogger = ActivityLogger<AuditLog>;

impl ActivityLogger<AuditLog> {
    pub fn append(&self, session_id: &str, message: &str) {
        let path = log_paths::audit_log_path(&self.log_dir, session_id);
        if let Err(e) = self.write_line(&path, "coordinator", message) {
            tracing::warn!(session_id, error = %e, "failed to write coordinator audit log");
        }
    }
}

#[cfg(test)]
#[path = "activity_logger_tests.rs"]
mod tests;
