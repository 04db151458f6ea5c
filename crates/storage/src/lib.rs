// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer: append-only event log, snapshot/checkpoint persistence,
//! and the materialized-state projections folded from it.

mod checkpoint;
pub mod consolidation;
mod migration;
mod snapshot;
mod state;
mod wal;

/// Current snapshot schema version; bump alongside a new entry in
/// [`migration::MigrationRegistry`].
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub use checkpoint::{
    CheckpointError, CheckpointHandle, CheckpointResult, CheckpointWriter, Checkpointer,
    FsCheckpointWriter, load_snapshot,
};
pub use consolidation::{
    classify_stray, discover_strays, finalize_stray, migrate_stray, plan_stray,
    ConsolidationError, ConsolidationPlan, MigrationReport, PlanAction, StrayFinding,
    StraySchema, TableMigration,
};
pub use migration::{Migration, MigrationError, MigrationRegistry};
pub use snapshot::{Snapshot, SnapshotError};
pub use state::{CoordinatorAuditRow, EvalRunRow, MaterializedState, Regression, ThreadRecord};
pub use wal::{Wal, WalEntry, WalError};
