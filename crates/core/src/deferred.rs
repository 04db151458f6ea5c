// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable cross-process future: a row-backed rendezvous one agent resolves
//! and another awaits.

use crate::DeferredId;
use serde::{Deserialize, Serialize};

/// A persistent promise keyed by an opaque `url`. Lifecycle: *created*
/// (`resolved = false`) -> *resolved* (value or error set) -> *expired*
/// (TTL passed while still unresolved). Exactly one created -> resolved
/// transition is allowed; later `resolve` calls on an already-resolved row
/// are ignored idempotently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deferred {
    pub id: DeferredId,
    pub resolved: bool,
    pub value: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at_epoch_ms: i64,
    pub expires_at_epoch_ms: i64,
}

impl Deferred {
    pub fn is_expired(&self, now_epoch_ms: i64) -> bool {
        !self.resolved && now_epoch_ms >= self.expires_at_epoch_ms
    }
}

/// Outcome of an `await` poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AwaitOutcome {
    Value(serde_json::Value),
    Error(String),
    TimedOut,
}
