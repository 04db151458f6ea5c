// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registration. First-writer-wins on name; subsequent registrations
//! of the same name are folded in as a touch by `apply_event`, never a
//! second row.

use sw_core::{Clock, Event};

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;

impl<C: Clock> Coordinator<C> {
    pub async fn register_agent(
        &self,
        name: &str,
        program: &str,
        model: &str,
        task_description: &str,
    ) -> Result<(), CoordinatorError> {
        if name.trim().is_empty() {
            return Err(CoordinatorError::Validation("agent name must not be empty".into()));
        }
        let now = self.now_epoch_ms();
        self.append(Event::AgentRegistered {
            name: name.to_string(),
            program: program.to_string(),
            model: model.to_string(),
            task_description: task_description.to_string(),
            registered_at_epoch_ms: now,
        })?;
        Ok(())
    }
}
