// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable cross-process future. Generalizes the teacher's single-process
//! `Decision` row (create -> externally resolve -> await) into a
//! TTL-bounded rendezvous backed by the shared store rather than an
//! in-memory channel, since the resolver and the waiter may be different
//! processes (Design Notes: "coroutine-style cross-agent waits").

use std::time::Duration;

use sw_core::{AwaitOutcome, Clock, DeferredId, Event};
use tokio::time::sleep;

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "deferred_tests.rs"]
mod tests;

/// Initial backoff for the `await` poll loop.
const POLL_START: Duration = Duration::from_millis(25);
/// Backoff cap; exponential growth never exceeds this (Design Notes (c)).
const POLL_CAP: Duration = Duration::from_millis(500);

impl<C: Clock> Coordinator<C> {
    pub async fn create_deferred(&self, ttl_seconds: i64) -> Result<DeferredId, CoordinatorError> {
        let now = self.now_epoch_ms();
        let id = DeferredId::from_token(self.next_id());
        self.append(Event::DeferredCreated {
            id: id.clone(),
            created_at_epoch_ms: now,
            expires_at_epoch_ms: now + ttl_seconds.max(0) * 1000,
        })?;
        Ok(id)
    }

    /// Idempotent: a second `resolve` on an already-resolved id is ignored.
    pub async fn resolve_deferred(
        &self,
        id: &DeferredId,
        value: Option<serde_json::Value>,
        error: Option<String>,
    ) -> Result<(), CoordinatorError> {
        let now = self.now_epoch_ms();
        let deferred = self
            .with_state(|s| s.deferred.get(id).cloned())
            .ok_or_else(|| CoordinatorError::DeferredNotFound(id.to_string()))?;
        if deferred.is_expired(now) {
            return Err(CoordinatorError::DeferredExpired(id.to_string()));
        }
        self.append(Event::DeferredResolved {
            id: id.clone(),
            value,
            error,
            resolved_at_epoch_ms: now,
        })?;
        Ok(())
    }

    /// Polls with capped exponential backoff until resolved or `timeout_seconds`
    /// elapses (whichever the deferred's own `expires_at` doesn't hit first).
    pub async fn await_deferred(
        &self,
        id: &DeferredId,
        timeout_seconds: i64,
    ) -> Result<AwaitOutcome, CoordinatorError> {
        let deadline = self.clock.now() + Duration::from_secs(timeout_seconds.max(0) as u64);
        let mut backoff = POLL_START;

        loop {
            let snapshot = self
                .with_state(|s| s.deferred.get(id).cloned())
                .ok_or_else(|| CoordinatorError::DeferredNotFound(id.to_string()))?;

            if snapshot.resolved {
                if let Some(err) = snapshot.error {
                    return Ok(AwaitOutcome::Error(err));
                }
                return Ok(AwaitOutcome::Value(snapshot.value.unwrap_or(serde_json::Value::Null)));
            }

            let now_ms = self.now_epoch_ms();
            if snapshot.is_expired(now_ms) || self.clock.now() >= deadline {
                return Ok(AwaitOutcome::TimedOut);
            }

            sleep(backoff).await;
            backoff = (backoff * 2).min(POLL_CAP);
        }
    }
}
