// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

mod worker_tests {
    use super::*;

    #[test]
    fn append_creates_log_file_and_writes_line() {
        let dir = tempdir().unwrap();
        let logger = WorkerLogger::new(dir.path().to_path_buf());

        logger.append("w1", "reserved cell-42");

        let path = log_paths::worker_log_path(dir.path(), "w1");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[worker] reserved cell-42"));
    }

    #[test]
    fn append_accumulates_multiple_lines() {
        let dir = tempdir().unwrap();
        let logger = WorkerLogger::new(dir.path().to_path_buf());

        logger.append("w1", "first");
        logger.append("w1", "second");

        let path = log_paths::worker_log_path(dir.path(), "w1");
        let contents = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[worker] first"));
        assert!(lines[1].ends_with("[worker] second"));
    }

    #[test]
    fn append_separates_distinct_workers() {
        let dir = tempdir().unwrap();
        let logger = WorkerLogger::new(dir.path().to_path_buf());

        logger.append("w1", "hello from w1");
        logger.append("w2", "hello from w2");

        let p1 = log_paths::worker_log_path(dir.path(), "w1");
        let p2 = log_paths::worker_log_path(dir.path(), "w2");
        assert!(fs::read_to_string(p1).unwrap().contains("hello from w1"));
        assert!(fs::read_to_string(p2).unwrap().contains("hello from w2"));
    }
}

mod audit_tests {
    use super::*;

    #[test]
    fn append_creates_log_file_and_writes_line() {
        let dir = tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().to_path_buf());

        logger.append("session-001", "guardrail rejected releaseAllForProject");

        let path = log_paths::audit_log_path(dir.path(), "session-001");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[coordinator] guardrail rejected releaseAllForProject"));
    }

    #[test]
    fn append_separates_distinct_sessions() {
        let dir = tempdir().unwrap();
        let logger = AuditLogger::new(dir.path().to_path_buf());

        logger.append("session-a", "alpha");
        logger.append("session-b", "beta");

        let pa = log_paths::audit_log_path(dir.path(), "session-a");
        let pb = log_paths::audit_log_path(dir.path(), "session-b");
        assert!(fs::read_to_string(pa).unwrap().contains("alpha"));
        assert!(fs::read_to_string(pb).unwrap().contains("beta"));
    }
}
