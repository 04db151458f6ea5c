// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-reader resume points.

use serde::{Deserialize, Serialize};

/// Lets an external reader (fan-out client, analytics job) resume from a
/// known offset instead of replaying the whole log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub stream_name: String,
    pub checkpoint: String,
    pub position: u64,
    pub updated_at_epoch_ms: i64,
}
