// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer bookkeeping for the background sweeps the coordinator loop runs:
//! ack-TTL, reservation expiry, and deferred expiry all share one wheel.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Timer {
    fires_at: Instant,
}

/// Tracks named, one-shot deadlines. Does not know what a fired timer
/// means; the caller maps ids back to domain actions.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: HashMap<String, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm or re-arm a timer. Re-arming replaces the previous deadline.
    pub fn set_timer(&mut self, id: String, duration: Duration, now: Instant) {
        let fires_at = now + duration;
        self.timers.insert(id, Timer { fires_at });
    }

    pub fn cancel_timer(&mut self, id: &str) {
        self.timers.remove(id);
    }

    pub fn cancel_timers_with_prefix(&mut self, prefix: &str) {
        self.timers.retain(|id, _| !id.starts_with(prefix));
    }

    /// Ids of every timer whose deadline has passed, removing them from
    /// the wheel.
    pub fn fired_timers(&mut self, now: Instant) -> Vec<String> {
        let mut fired = Vec::new();
        self.timers.retain(|id, timer| {
            if timer.fires_at <= now {
                fired.push(id.clone());
                false
            } else {
                true
            }
        });
        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.fires_at).min()
    }

    pub fn has_timers(&self) -> bool {
        !self.timers.is_empty()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
