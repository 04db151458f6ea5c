// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator guardrail: privileged operations (`releaseAllForProject`,
//! `releaseAllForAgent`, force-reservation, close-epic) require an explicit,
//! injected `CoordinatorContext` rather than ambient global state, per the
//! Design Notes' guidance. A rejection is recorded as a
//! `coordinator_violation` audit row; a permitted privileged call is
//! recorded as a `coordinator_decision` row.

use sw_core::{Clock, CoordinatorContext, CoordinatorDecisionKind, Event};

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "guardrail_tests.rs"]
mod tests;

impl<C: Clock> Coordinator<C> {
    pub(crate) async fn guard_coordinator(
        &self,
        ctx: &CoordinatorContext,
        attempted_operation: &str,
    ) -> Result<(), CoordinatorError> {
        if !ctx.is_coordinator() {
            let now = self.now_epoch_ms();
            self.append(Event::CoordinatorViolation {
                session_id: ctx.session_id().to_string(),
                guard: "coordinator_only".to_string(),
                attempted_operation: attempted_operation.to_string(),
                occurred_at_epoch_ms: now,
            })?;
            return Err(CoordinatorError::Guard {
                guard: "coordinator_only".to_string(),
                message: format!("'{attempted_operation}' requires coordinator context"),
            });
        }
        Ok(())
    }

    /// Records a privileged action that the guard above let through, so the
    /// audit trail shows both attempted and granted privileged operations.
    pub(crate) async fn record_decision(
        &self,
        ctx: &CoordinatorContext,
        kind: CoordinatorDecisionKind,
        subject: &str,
    ) -> Result<(), CoordinatorError> {
        let now = self.now_epoch_ms();
        self.append(Event::CoordinatorDecision {
            session_id: ctx.session_id().to_string(),
            kind,
            subject: subject.to_string(),
            decided_at_epoch_ms: now,
        })?;
        Ok(())
    }
}
