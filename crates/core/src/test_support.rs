// SPDX-License-Identifier: MIT

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::event::{Event, EventKind};
use crate::ids::{ProjectId, WorkflowId};
use crate::workflow::{KanbanColumn, WorkflowState, WorkflowStatus};

/// Build a `todo`-column workflow at the given position, for engine tests.
pub fn todo_workflow(title: &str, position: i64) -> WorkflowState {
    WorkflowState::builder().title(title).status(WorkflowStatus::Pending).kanban_column(KanbanColumn::Todo).kanban_position(position).build()
}

pub fn workflow_completed_event(workflow_id: WorkflowId, project_id: ProjectId) -> Event {
    Event::new(1, workflow_id, Some(project_id), EventKind::WorkflowCompleted { pr_url: None, pr_number: None })
}

pub fn workflow_failed_event(workflow_id: WorkflowId, project_id: ProjectId, error: &str) -> Event {
    Event::new(1, workflow_id, Some(project_id), EventKind::WorkflowFailed { error: error.to_string() })
}
