// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared path builders for per-worker and per-session log files.

use std::path::{Path, PathBuf};

/// `{logs_dir}/worker/{worker_name}.log`
pub fn worker_log_path(logs_dir: &Path, worker_name: &str) -> PathBuf {
    logs_dir.join("worker").join(format!("{worker_name}.log"))
}

/// `{logs_dir}/coordinator/{session_id}.log`
pub fn audit_log_path(logs_dir: &Path, session_id: &str) -> PathBuf {
    logs_dir.join("coordinator").join(format!("{session_id}.log"))
}

#[cfg(test)]
#[path = "log_paths_tests.rs"]
mod tests;
