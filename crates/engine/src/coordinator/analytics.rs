// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analytics views: eval-run recording and pairwise regression detection.
//! Deliberately dumb storage (append one row, compare the last two) rather
//! than a rolling baseline, matching the scenario's "current vs previous
//! run" framing.

use sw_core::{Clock, Event};
use sw_storage::Regression;

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "analytics_tests.rs"]
mod tests;

impl<C: Clock> Coordinator<C> {
    pub async fn record_eval_run(
        &self,
        eval_name: &str,
        score: f64,
    ) -> Result<(), CoordinatorError> {
        let now = self.now_epoch_ms();
        self.append(Event::EvalRunRecorded {
            eval_name: eval_name.to_string(),
            score,
            recorded_at_epoch_ms: now,
        })?;
        Ok(())
    }

    /// Regressions across every eval with at least two recorded runs,
    /// comparing only the most recent pair.
    pub fn eval_regressions(&self) -> Vec<Regression> {
        self.with_state(|s| s.eval_regressions())
    }
}
