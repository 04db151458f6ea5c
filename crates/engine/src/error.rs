// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator-facing error taxonomy.
//!
//! Every variant maps onto one [`sw_core::ErrorKind`] so the daemon/CLI
//! boundary can build its envelope without matching on this enum directly.

use sw_core::{ClassifiedError, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("reservation conflict: {path} held by {holder}")]
    ReservationConflict { path: String, holder: String },

    #[error("guard '{guard}' rejected: {message}")]
    Guard { guard: String, message: String },

    #[error("agent not found: {0}")]
    AgentNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("reservation not found: {0}")]
    ReservationNotFound(String),

    #[error("cell not found: {0}")]
    CellNotFound(String),

    #[error("worker not found: {0}")]
    WorkerNotFound(String),

    #[error("deferred not found: {0}")]
    DeferredNotFound(String),

    #[error("deferred {0} timed out waiting for resolution")]
    DeferredTimedOut(String),

    #[error("deferred {0} expired before it could be resolved")]
    DeferredExpired(String),

    #[error("storage unavailable: {0}")]
    Storage(#[from] sw_storage::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] sw_storage::SnapshotError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] sw_storage::CheckpointError),

    #[error("invariant violated: {0}")]
    Fatal(String),
}

impl ClassifiedError for CoordinatorError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoordinatorError::Validation(_) => ErrorKind::Validation,
            CoordinatorError::ReservationConflict { .. } => ErrorKind::Conflict,
            CoordinatorError::Guard { .. } => ErrorKind::Guard,
            CoordinatorError::AgentNotFound(_)
            | CoordinatorError::MessageNotFound(_)
            | CoordinatorError::ReservationNotFound(_)
            | CoordinatorError::CellNotFound(_)
            | CoordinatorError::WorkerNotFound(_)
            | CoordinatorError::DeferredNotFound(_) => ErrorKind::NotFound,
            CoordinatorError::DeferredTimedOut(_) => ErrorKind::Timeout,
            CoordinatorError::DeferredExpired(_) => ErrorKind::NotFound,
            CoordinatorError::Storage(_)
            | CoordinatorError::Snapshot(_)
            | CoordinatorError::Checkpoint(_) => ErrorKind::StorageUnavailable,
            CoordinatorError::Fatal(_) => ErrorKind::Fatal,
        }
    }

    fn guard(&self) -> Option<&str> {
        match self {
            CoordinatorError::Guard { guard, .. } => Some(guard),
            _ => None,
        }
    }
}
