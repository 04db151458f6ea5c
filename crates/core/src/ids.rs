// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newtype identifiers for coordination-store entities.

use crate::define_id;

define_id! {
    /// Surrogate id of an appended event row.
    pub struct EventId;
}

define_id! {
    /// Durable message id.
    pub struct MessageId;
}

define_id! {
    /// Conversation/thread id a set of messages is grouped under.
    pub struct ThreadId;
}

define_id! {
    /// File-path reservation id.
    pub struct ReservationId;
}

define_id! {
    /// Work-unit id. Roots are `{project}-{hash}`, subtasks are `{parent}.{index}`.
    pub struct CellId;
}

define_id! {
    /// Durable deferred future id, shaped `deferred:<opaque>`.
    pub struct DeferredId;
}

define_id! {
    /// Worker process id (one per spawned subtask worker).
    pub struct WorkerId;
}

impl DeferredId {
    /// Mint a fresh deferred id from a generated token, producing the
    /// caller-opaque `deferred:<token>` shape the spec requires.
    pub fn from_token(token: impl AsRef<str>) -> Self {
        Self::new(format!("deferred:{}", token.as_ref()))
    }
}
