// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::test_support::agent_registered_event;
use tempfile::tempdir;

#[test]
fn append_assigns_monotonically_increasing_sequence_numbers() {
    let dir = tempdir().unwrap();
    let mut wal = Wal::open(&dir.path().join("wal.jsonl"), 0).unwrap();

    let seq1 = wal.append(&agent_registered_event("W1")).unwrap();
    let seq2 = wal.append(&agent_registered_event("W2")).unwrap();
    assert_eq!(seq1, 1);
    assert_eq!(seq2, 2);
}

#[test]
fn unflushed_entries_are_not_visible_to_next_unprocessed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();

    wal.append(&agent_registered_event("W1")).unwrap();
    // next_unprocessed flushes internally before reading.
    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 1);
    assert!(wal.next_unprocessed().unwrap().is_none());
}

#[test]
fn reopening_wal_resumes_from_persisted_write_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&agent_registered_event("W1")).unwrap();
        wal.append(&agent_registered_event("W2")).unwrap();
        wal.flush().unwrap();
    }

    let mut wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 2);
    let seq3 = wal.append(&agent_registered_event("W3")).unwrap();
    assert_eq!(seq3, 3);
}

#[test]
fn mark_processed_is_respected_on_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&agent_registered_event("W1")).unwrap();
        wal.append(&agent_registered_event("W2")).unwrap();
        wal.flush().unwrap();
        wal.mark_processed(1);
    }

    let mut wal = Wal::open(&path, 1).unwrap();
    let entry = wal.next_unprocessed().unwrap().unwrap();
    assert_eq!(entry.seq, 2);
}

#[test]
fn entries_after_returns_only_entries_past_given_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();

    wal.append(&agent_registered_event("W1")).unwrap();
    wal.append(&agent_registered_event("W2")).unwrap();
    wal.append(&agent_registered_event("W3")).unwrap();
    wal.flush().unwrap();

    let entries = wal.entries_after(1).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 2);
    assert_eq!(entries[1].seq, 3);
}

#[test]
fn truncate_before_drops_earlier_entries_but_keeps_the_rest() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();

    for i in 0..5 {
        wal.append(&agent_registered_event(&format!("W{i}"))).unwrap();
    }
    wal.flush().unwrap();
    wal.mark_processed(3);

    wal.truncate_before(3).unwrap();

    let remaining = wal.entries_after(0).unwrap();
    assert_eq!(remaining.len(), 3);
    assert_eq!(remaining[0].seq, 3);
}

#[test]
fn corrupt_trailing_entry_is_skipped_without_losing_valid_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");

    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&agent_registered_event("W1")).unwrap();
        wal.flush().unwrap();
    }

    // Append a corrupt trailing line directly.
    use std::fs::OpenOptions;
    use std::io::Write as _;
    let mut f = OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(f, "{{not valid json").unwrap();
    drop(f);

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 1);
}
