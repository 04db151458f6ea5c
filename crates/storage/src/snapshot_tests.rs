// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::MaterializedState;
use std::io::Write;
use sw_core::test_support::{agent_registered_event, cell_created_event};
use tempfile::tempdir;

fn create_test_state() -> MaterializedState {
    let mut state = MaterializedState::default();
    state.apply_event(&agent_registered_event("W1"));
    state.apply_event(&cell_created_event("proj-1", "test cell"));
    state
}

#[test]
fn test_snapshot_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let state = create_test_state();
    let snapshot = Snapshot::new(42, state);

    snapshot.save(&path).unwrap();
    assert!(path.exists());

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 42);
    assert_eq!(loaded.state.agents.len(), 1);
    assert!(loaded.state.agents.contains_key("W1"));
}

#[test]
fn test_load_nonexistent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nonexistent.json");

    let result = Snapshot::load(&path).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_snapshot_atomic_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    let tmp_path = path.with_extension("tmp");

    let state = create_test_state();
    let snapshot = Snapshot::new(1, state);

    snapshot.save(&path).unwrap();

    assert!(!tmp_path.exists());
    assert!(path.exists());
}

#[test]
fn test_snapshot_preserves_state() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut state = MaterializedState::default();
    for i in 0..3 {
        state.apply_event(&agent_registered_event(&format!("agent-{i}")));
        state.apply_event(&cell_created_event(&format!("proj-{i}"), &format!("cell {i}")));
    }

    let snapshot = Snapshot::new(100, state);
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 100);
    assert_eq!(loaded.state.agents.len(), 3);
    assert_eq!(loaded.state.cells.len(), 3);

    for i in 0..3 {
        let key = format!("agent-{i}");
        assert!(loaded.state.agents.contains_key(&key));
    }
}

#[test]
fn test_load_corrupt_snapshot_returns_none_and_creates_bak() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut f = File::create(&path).unwrap();
    f.write_all(b"\xe5\x03\x01binary-garbage").unwrap();
    drop(f);

    let result = Snapshot::load(&path).unwrap();
    assert!(result.is_none());

    assert!(!path.exists());
    let bak = path.with_extension("bak");
    assert!(bak.exists());
}

#[test]
fn test_load_corrupt_snapshot_rotates_bak_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    for i in 1..=4u8 {
        let mut f = File::create(&path).unwrap();
        f.write_all(&[i; 4]).unwrap();
        drop(f);

        let result = Snapshot::load(&path).unwrap();
        assert!(result.is_none());
    }

    let bak1 = path.with_extension("bak");
    assert!(bak1.exists());
    assert_eq!(fs::read(&bak1).unwrap(), vec![4u8; 4]);

    let bak2 = path.with_extension("bak.2");
    assert!(bak2.exists());
    assert_eq!(fs::read(&bak2).unwrap(), vec![3u8; 4]);

    let bak3 = path.with_extension("bak.3");
    assert!(bak3.exists());
    assert_eq!(fs::read(&bak3).unwrap(), vec![2u8; 4]);

    let bak4 = path.with_extension("bak.4");
    assert!(!bak4.exists());
}

#[test]
fn test_snapshot_round_trip_with_reservations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut state = MaterializedState::default();
    state.apply_event(&sw_core::test_support::reservation_created_event(
        "r1", "W1", "src/a.ts",
    ));
    state.apply_event(&sw_core::Event::ReservationReleased {
        id: sw_core::ReservationId::new("r1"),
        released_at_epoch_ms: 5_000,
        reason: "done".to_string(),
    });

    let snapshot = Snapshot::new(50, state);
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 50);

    let reservation = &loaded.state.reservations[&sw_core::ReservationId::new("r1")];
    assert_eq!(reservation.released_at_epoch_ms, Some(5_000));
}
