// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work-unit (cell) lifecycle: create, update, status transitions, labels,
//! dependencies, comments, epic/child relationships, and assignment.
//! Epic-closure eligibility is detected here but closure itself remains an
//! explicit coordinator action (Design Notes (c)).

use sw_core::{
    Cell, CellId, CellStatus, CellType, Clock, DependencyRelationship, Event, MAX_PRIORITY,
    MAX_TITLE_LEN, WorkerId,
};

use crate::error::CoordinatorError;

use super::Coordinator;

#[cfg(test)]
#[path = "cells_tests.rs"]
mod tests;

fn validate_priority(priority: u8) -> Result<(), CoordinatorError> {
    if priority > MAX_PRIORITY {
        return Err(CoordinatorError::Validation(format!(
            "priority {priority} exceeds maximum {MAX_PRIORITY}"
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), CoordinatorError> {
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoordinatorError::Validation(format!(
            "title exceeds maximum length {MAX_TITLE_LEN}"
        )));
    }
    Ok(())
}

impl<C: Clock> Coordinator<C> {
    pub async fn create_cell(
        &self,
        id: CellId,
        cell_type: CellType,
        title: &str,
        description: &str,
        priority: u8,
        parent_id: Option<CellId>,
    ) -> Result<CellId, CoordinatorError> {
        validate_priority(priority)?;
        validate_title(title)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellCreated {
            id: id.clone(),
            cell_type,
            title: title.to_string(),
            description: description.to_string(),
            priority,
            parent_id,
            created_at_epoch_ms: now,
        })?;
        Ok(id)
    }

    pub async fn update_cell(
        &self,
        id: &CellId,
        title: Option<String>,
        description: Option<String>,
        priority: Option<u8>,
    ) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        if let Some(t) = &title {
            validate_title(t)?;
        }
        if let Some(p) = priority {
            validate_priority(p)?;
        }
        let now = self.now_epoch_ms();
        self.append(Event::CellUpdated {
            id: id.clone(),
            title,
            description,
            priority,
            updated_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn change_status(
        &self,
        id: &CellId,
        to: CellStatus,
    ) -> Result<(), CoordinatorError> {
        let cell = self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellStatusChanged {
            id: id.clone(),
            from: cell.status,
            to,
            changed_at_epoch_ms: now,
        })?;
        Ok(())
    }

    /// Closure requires all non-tombstoned children already closed.
    pub async fn close_cell(&self, id: &CellId, reason: &str) -> Result<(), CoordinatorError> {
        let cell = self.require_cell(id)?;
        let open_children = self.with_state(|s| {
            cell.children
                .iter()
                .filter_map(|cid| s.get_cell(cid))
                .any(|c| c.status != CellStatus::Closed)
        });
        if open_children {
            return Err(CoordinatorError::Validation(
                "cannot close a cell with open children".into(),
            ));
        }
        let now = self.now_epoch_ms();
        self.append(Event::CellClosed {
            id: id.clone(),
            closed_reason: reason.to_string(),
            closed_at_epoch_ms: now,
        })?;

        if let Some(parent_id) = &cell.parent_id {
            self.maybe_emit_epic_closure_eligible(parent_id).await?;
        }
        Ok(())
    }

    pub async fn reopen_cell(&self, id: &CellId) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellReopened {
            id: id.clone(),
            reopened_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn delete_cell(&self, id: &CellId) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellDeleted {
            id: id.clone(),
            tombstoned_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn add_dependency(
        &self,
        cell_id: &CellId,
        depends_on_id: &CellId,
        relationship: DependencyRelationship,
    ) -> Result<(), CoordinatorError> {
        self.require_cell(cell_id)?;
        self.require_cell(depends_on_id)?;
        self.append(Event::CellDependencyAdded {
            cell_id: cell_id.clone(),
            depends_on_id: depends_on_id.clone(),
            relationship,
        })?;
        Ok(())
    }

    pub async fn remove_dependency(
        &self,
        cell_id: &CellId,
        depends_on_id: &CellId,
    ) -> Result<(), CoordinatorError> {
        self.append(Event::CellDependencyRemoved {
            cell_id: cell_id.clone(),
            depends_on_id: depends_on_id.clone(),
        })?;
        Ok(())
    }

    pub async fn add_label(&self, id: &CellId, label: &str) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        self.append(Event::CellLabelAdded {
            id: id.clone(),
            label: label.to_string(),
        })?;
        Ok(())
    }

    pub async fn remove_label(&self, id: &CellId, label: &str) -> Result<(), CoordinatorError> {
        self.append(Event::CellLabelRemoved {
            id: id.clone(),
            label: label.to_string(),
        })?;
        Ok(())
    }

    pub async fn add_comment(
        &self,
        id: &CellId,
        author: &str,
        body: &str,
    ) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellCommentAdded {
            id: id.clone(),
            author: author.to_string(),
            body: body.to_string(),
            created_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn add_epic_child(
        &self,
        epic_id: &CellId,
        child_id: &CellId,
    ) -> Result<(), CoordinatorError> {
        let epic = self.require_cell(epic_id)?;
        if !epic.is_epic() {
            return Err(CoordinatorError::Validation(format!(
                "{epic_id} is not an epic"
            )));
        }
        self.require_cell(child_id)?;
        self.append(Event::CellEpicChildAdded {
            epic_id: epic_id.clone(),
            child_id: child_id.clone(),
        })?;
        Ok(())
    }

    pub async fn assign_cell(&self, id: &CellId, assignee: &str) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellAssigned {
            id: id.clone(),
            assignee: assignee.to_string(),
            assigned_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub async fn start_work(&self, id: &CellId, worker_id: &WorkerId) -> Result<(), CoordinatorError> {
        self.require_cell(id)?;
        let now = self.now_epoch_ms();
        self.append(Event::CellWorkStarted {
            id: id.clone(),
            worker_id: worker_id.clone(),
            started_at_epoch_ms: now,
        })?;
        Ok(())
    }

    pub(crate) fn require_cell(&self, id: &CellId) -> Result<Cell, CoordinatorError> {
        self.with_state(|s| s.get_cell(id).cloned())
            .ok_or_else(|| CoordinatorError::CellNotFound(id.to_string()))
    }

    async fn maybe_emit_epic_closure_eligible(&self, epic_id: &CellId) -> Result<(), CoordinatorError> {
        let Some(epic) = self.with_state(|s| s.get_cell(epic_id).cloned()) else {
            return Ok(());
        };
        if !epic.is_epic() {
            return Ok(());
        }
        let (all_closed, child_ids, aggregate_duration_ms) = self.with_state(|s| {
            let children: Vec<&Cell> = epic.children.iter().filter_map(|c| s.get_cell(c)).collect();
            let all_closed = !children.is_empty() && children.iter().all(|c| c.status == CellStatus::Closed);
            let duration: i64 = children
                .iter()
                .filter_map(|c| c.closed_at_epoch_ms.map(|closed| closed - c.created_at_epoch_ms))
                .sum();
            (all_closed, epic.children.clone(), duration)
        });
        if !all_closed {
            return Ok(());
        }
        self.append(Event::CellEpicClosureEligible {
            epic_id: epic_id.clone(),
            child_ids,
            aggregate_duration_ms,
            files_touched: Vec::new(),
        })?;
        Ok(())
    }
}
