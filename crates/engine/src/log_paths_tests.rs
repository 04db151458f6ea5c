// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn worker_log_path_builds_expected_path() {
    let result = worker_log_path(Path::new("/state/logs"), "w1");
    assert_eq!(result, PathBuf::from("/state/logs/worker/w1.log"));
}

#[test]
fn audit_log_path_builds_expected_path() {
    let result = audit_log_path(Path::new("/state/logs"), "session-001");
    assert_eq!(
        result,
        PathBuf::from("/state/logs/coordinator/session-001.log")
    );
}
