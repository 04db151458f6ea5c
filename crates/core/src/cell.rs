// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projected cell (work-unit) rows.

use crate::{CellId, CellStatus, CellType};
use serde::{Deserialize, Serialize};

pub const MAX_PRIORITY: u8 = 4;
pub const MAX_TITLE_LEN: usize = 500;

/// A unit of work: bug, feature, task, epic, or chore. IDs are
/// `{project}-{hash}` for roots and `{parent}.{index}` for subtasks
/// produced by decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub cell_type: CellType,
    pub status: CellStatus,
    pub title: String,
    pub description: String,
    /// 0 (highest) to [`MAX_PRIORITY`] (lowest).
    pub priority: u8,
    pub parent_id: Option<CellId>,
    pub assignee: Option<String>,
    pub created_at_epoch_ms: i64,
    pub updated_at_epoch_ms: i64,
    pub closed_at_epoch_ms: Option<i64>,
    pub closed_reason: Option<String>,
    pub tombstoned_at_epoch_ms: Option<i64>,
    pub labels: Vec<String>,
    pub children: Vec<CellId>,
}

impl Cell {
    pub fn is_tombstoned(&self) -> bool {
        self.tombstoned_at_epoch_ms.is_some()
    }

    pub fn is_epic(&self) -> bool {
        matches!(self.cell_type, CellType::Epic)
    }

    /// Truncate a title to at most `n` chars for table display (spec's CLI
    /// `cells` subcommand truncates at 47).
    pub fn truncated_title(&self, n: usize) -> String {
        if self.title.chars().count() <= n {
            self.title.clone()
        } else {
            self.title.chars().take(n).collect()
        }
    }
}

/// `(cell_id, depends_on_id, relationship)` edge. Stored as rows, never
/// nested objects -- graph traversal (cycle checks, blocked-by queries) is
/// a bounded BFS in application code over this edge list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDependency {
    pub cell_id: CellId,
    pub depends_on_id: CellId,
    pub relationship: crate::DependencyRelationship,
}

/// A comment attached to a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellComment {
    pub cell_id: CellId,
    pub author: String,
    pub body: String,
    pub created_at_epoch_ms: i64,
}

pub fn priority_in_range(priority: u8) -> bool {
    priority <= MAX_PRIORITY
}

pub fn title_length_ok(title: &str) -> bool {
    title.chars().count() <= MAX_TITLE_LEN
}
