// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-path reservation engine: glob-matched exclusive locks with TTL and
//! coordinator-only bulk release. Acquisition is two-phase -- compute
//! conflicts against the in-memory index, then re-validate under the same
//! lock before the WAL append commits, which is the optimistic-CAS the spec
//! calls for collapsed into one critical section (there is only one
//! writer).

use sw_core::{Clock, CoordinatorContext, Event, ReservationConflict, ReservationId};

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "reservations_tests.rs"]
mod tests;

/// Result of a `reserve` call: every requested path is either granted or
/// reported as a conflict; a partial result is not an error.
#[derive(Debug, Clone, Default)]
pub struct ReserveOutcome {
    pub granted: Vec<ReservationId>,
    pub conflicts: Vec<ReservationConflict>,
}

pub struct ReserveOptions {
    pub exclusive: bool,
    pub reason: Option<String>,
    pub ttl_seconds: Option<i64>,
}

impl Default for ReserveOptions {
    fn default() -> Self {
        Self {
            exclusive: true,
            reason: None,
            ttl_seconds: None,
        }
    }
}

impl<C: Clock> Coordinator<C> {
    pub async fn reserve(
        &self,
        agent_name: &str,
        paths: &[String],
        opts: ReserveOptions,
    ) -> Result<ReserveOutcome, CoordinatorError> {
        let now = self.now_epoch_ms();
        let expires_at = opts
            .ttl_seconds
            .map(|ttl| now + ttl.max(0) * 1000);

        let mut outcome = ReserveOutcome::default();
        let mut to_grant = Vec::new();

        for path in paths {
            let blocking = self.blocking_conflicts_for(path, now, opts.exclusive);

            if blocking.is_empty() {
                to_grant.push(path.clone());
            } else {
                outcome.conflicts.extend(blocking);
            }
        }

        // Re-check immediately before commit: single-writer critical
        // section makes this the optimistic-CAS re-validation the spec
        // describes for a multi-writer backing store.
        for path in &to_grant {
            let recheck = self.blocking_conflicts_for(path, now, opts.exclusive);
            if !recheck.is_empty() {
                outcome.conflicts.extend(recheck);
                continue;
            }
            let id = ReservationId::new(self.next_id());
            self.append(Event::ReservationCreated {
                id: id.clone(),
                agent_name: agent_name.to_string(),
                path_pattern: path.clone(),
                exclusive: opts.exclusive,
                reason: opts.reason.clone(),
                created_at_epoch_ms: now,
                expires_at_epoch_ms: expires_at,
                lock_holder_id: id.to_string(),
            })?;
            outcome.granted.push(id);
        }

        Ok(outcome)
    }

    /// An overlapping reservation blocks the request if either side is
    /// exclusive: the existing holder, or the incoming request itself. Two
    /// shared (non-exclusive) reservations on the same path never conflict.
    fn blocking_conflicts_for(&self, path: &str, now: i64, requester_exclusive: bool) -> Vec<ReservationConflict> {
        self.with_state(|s| {
            s.active_reservation_conflicts(path, now)
                .into_iter()
                .filter(|r| requester_exclusive || r.exclusive)
                .map(|r| ReservationConflict {
                    requested_path: path.to_string(),
                    holder_agent: r.agent_name.clone(),
                    holder_id: r.id.clone(),
                })
                .collect()
        })
    }

    /// Releases only `agent_name`'s reservations matching `paths`; with no
    /// paths, releases all of the caller's reservations. Releasing an
    /// already-released reservation is a no-op.
    pub async fn release(
        &self,
        agent_name: &str,
        paths: Option<&[String]>,
    ) -> Result<(), CoordinatorError> {
        let now = self.now_epoch_ms();
        let ids: Vec<ReservationId> = self.with_state(|s| {
            s.reservations
                .values()
                .filter(|r| r.agent_name == agent_name && r.released_at_epoch_ms.is_none())
                .filter(|r| {
                    paths
                        .map(|ps| ps.iter().any(|p| p == &r.path_pattern))
                        .unwrap_or(true)
                })
                .map(|r| r.id.clone())
                .collect()
        });

        for id in ids {
            self.append(Event::ReservationReleased {
                id,
                released_at_epoch_ms: now,
                reason: "released".to_string(),
            })?;
        }
        Ok(())
    }

    /// Coordinator-only: releases every active reservation in the project.
    pub async fn release_all_for_project(
        &self,
        ctx: &CoordinatorContext,
        actor: &str,
    ) -> Result<(), CoordinatorError> {
        self.guard_coordinator(ctx, "releaseAllForProject").await?;
        let now = self.now_epoch_ms();
        let ids: Vec<ReservationId> = self.with_state(|s| {
            s.reservations
                .values()
                .filter(|r| r.released_at_epoch_ms.is_none())
                .map(|r| r.id.clone())
                .collect()
        });
        if ids.is_empty() {
            return Ok(());
        }
        self.append(Event::ReservationReleasedAll {
            ids,
            released_at_epoch_ms: now,
            actor: actor.to_string(),
        })?;
        self.record_decision(ctx, sw_core::CoordinatorDecisionKind::ReleaseAllForProject, actor)
            .await?;
        Ok(())
    }

    /// Coordinator-only: releases every active reservation held by
    /// `target_agent`.
    pub async fn release_all_for_agent(
        &self,
        ctx: &CoordinatorContext,
        actor: &str,
        target_agent: &str,
    ) -> Result<(), CoordinatorError> {
        self.guard_coordinator(ctx, "releaseAllForAgent").await?;
        let now = self.now_epoch_ms();
        let ids: Vec<ReservationId> = self.with_state(|s| {
            s.reservations
                .values()
                .filter(|r| r.agent_name == target_agent && r.released_at_epoch_ms.is_none())
                .map(|r| r.id.clone())
                .collect()
        });
        if ids.is_empty() {
            return Ok(());
        }
        self.append(Event::ReservationReleasedForAgent {
            ids,
            target_agent: target_agent.to_string(),
            released_at_epoch_ms: now,
            actor: actor.to_string(),
        })?;
        self.record_decision(ctx, sw_core::CoordinatorDecisionKind::ReleaseAllForAgent, target_agent)
            .await?;
        Ok(())
    }

    pub fn active_reservations(&self, agent: Option<&str>) -> Vec<sw_core::Reservation> {
        let now = self.now_epoch_ms();
        self.with_state(|s| {
            s.reservations
                .values()
                .filter(|r| r.is_active(now))
                .filter(|r| agent.map(|a| a == r.agent_name).unwrap_or(true))
                .cloned()
                .collect()
        })
    }

    /// Lazy TTL reclamation (Design Notes (b)): writes a `released` event
    /// with reason `"expired"` for every reservation whose TTL has passed
    /// but which has not yet been marked released.
    pub async fn reclaim_expired_reservations(&self) -> Result<u32, CoordinatorError> {
        let now = self.now_epoch_ms();
        let expired: Vec<ReservationId> = self.with_state(|s| {
            s.reservations
                .values()
                .filter(|r| {
                    r.released_at_epoch_ms.is_none()
                        && r.expires_at_epoch_ms.is_some_and(|exp| exp <= now)
                })
                .map(|r| r.id.clone())
                .collect()
        });
        let count = expired.len() as u32;
        for id in expired {
            self.append(Event::ReservationReleased {
                id,
                released_at_epoch_ms: now,
                reason: "expired".to_string(),
            })?;
        }
        Ok(count)
    }
}
