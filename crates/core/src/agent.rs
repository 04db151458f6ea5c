// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projected agent registry row.

use serde::{Deserialize, Serialize};

/// An agent identified by `(project_key, name)`. Names are agent-chosen;
/// the first `agent_registered` event for a name wins identity -- a
/// duplicate registration is folded in as a touch, never a second row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    pub program: String,
    pub model: String,
    pub task_description: String,
    pub registered_at_epoch_ms: i64,
    pub last_active_at_epoch_ms: i64,
}

impl Agent {
    pub fn touch(&mut self, at_epoch_ms: i64) {
        if at_epoch_ms > self.last_active_at_epoch_ms {
            self.last_active_at_epoch_ms = at_epoch_ms;
        }
    }
}
