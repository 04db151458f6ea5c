// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy.
//!
//! Every crate defines its own `thiserror` leaf enum for its own failure
//! modes, but each variant maps onto one of these kinds so the daemon/CLI
//! boundary can converge on a single `{success, data? | error}` envelope
//! regardless of which component raised it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed schema validation. Surfaced to caller; never retried.
    Validation,
    /// Reservation overlap, stale CAS, duplicate deferred resolve. Caller
    /// may retry with new inputs.
    Conflict,
    /// Caller lacks coordinator context. Carries a machine-readable `guard`
    /// field alongside the message.
    Guard,
    /// Target entity absent. Terminal for the call.
    NotFound,
    /// Deferred await exceeded TTL, or a verification step exceeded its
    /// budget. Terminal for that attempt.
    Timeout,
    /// Backing store failed; append fails atomically, no partial
    /// projection update. Caller may retry.
    StorageUnavailable,
    /// Schema invariant broken (e.g. a non-numeric timestamp). Surfaces
    /// loudly; the operation does not retry.
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Guard => "guard",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::Fatal => "fatal",
        }
    }
}

/// Implemented by every crate's leaf error enum so the daemon/CLI boundary
/// can build its JSON envelope without knowing about each crate's concrete
/// error type.
pub trait ClassifiedError: std::error::Error {
    fn kind(&self) -> ErrorKind;

    /// Machine-readable guard name, populated only for [`ErrorKind::Guard`].
    fn guard(&self) -> Option<&str> {
        None
    }
}

/// The uniform `{success, data? | error}` envelope every tool/CLI response
/// converges on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl ErrorEnvelope {
    pub fn from_classified(err: &dyn ClassifiedError) -> Self {
        Self {
            kind: err.kind().as_str().to_string(),
            message: err.to_string(),
            guard: err.guard().map(str::to_string),
        }
    }
}
