// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator guardrail context.
//!
//! Modeled as an explicit, injected context object per the design notes'
//! guidance on global mutable state: every privileged operation takes a
//! `&CoordinatorContext` rather than consulting ambient/global state. A
//! process-wide fallback (`CoordinatorContext::single_tenant`) exists only
//! for the single-tenant CLI entrypoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Session-scoped flag gating privileged operations
/// (`releaseAllForProject`, `releaseAllForAgent`). Set exactly once per
/// session via an out-of-band setup call, never by a worker-callable
/// operation.
#[derive(Clone)]
pub struct CoordinatorContext {
    session_id: String,
    is_coordinator: Arc<AtomicBool>,
}

impl CoordinatorContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            is_coordinator: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A single-tenant fallback for the CLI entrypoint, where the process
    /// itself is the only consumer and coordinator status is granted for
    /// the session's lifetime.
    pub fn single_tenant(session_id: impl Into<String>) -> Self {
        let ctx = Self::new(session_id);
        ctx.grant();
        ctx
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Out-of-band setup call; never exposed as a worker-callable operation.
    pub fn grant(&self) {
        self.is_coordinator.store(true, Ordering::SeqCst);
    }

    pub fn is_coordinator(&self) -> bool {
        self.is_coordinator.load(Ordering::SeqCst)
    }
}
