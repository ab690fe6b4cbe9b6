// SPDX-License-Identifier: MIT

//! `ProjectStateProvider`/`KanbanStateManager`: the per-project seams the
//! kanban engine drives through. Order from `list_active_projects` is the
//! engine's per-tick priority — the provider controls it, the engine just
//! iterates.

use quorum_bus::EventBus;
use quorum_core::{EngineState, KanbanColumn, WorkflowId, WorkflowState};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Project {
    pub id: quorum_core::ProjectId,
    pub name: String,
}

/// Carries cancellation/deadline plumbing an executor needs; `base` fields
/// are filled in by the caller, `project_id` is stamped on by
/// `ProjectStateProvider::project_execution_context`.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub project_id: Option<quorum_core::ProjectId>,
}

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error(transparent)]
    NotFound(#[from] quorum_core::NotFound),
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub trait KanbanStateManager: Send + Sync {
    fn load_by_id(&self, id: WorkflowId) -> Result<WorkflowState, KanbanError>;

    /// Lowest-position `todo` workflow, or `None` if the column is empty.
    fn get_next_kanban_workflow(&self) -> Option<WorkflowState>;

    fn move_workflow(&self, id: WorkflowId, column: KanbanColumn, position: i64) -> Result<(), KanbanError>;

    fn update_kanban_status(&self, id: WorkflowId, column: KanbanColumn, pr_url: Option<String>, pr_number: Option<u64>, error: String) -> Result<(), KanbanError>;

    fn get_kanban_engine_state(&self) -> EngineState;

    fn save_kanban_engine_state(&self, state: &EngineState) -> Result<(), KanbanError>;
}

pub trait ProjectStateProvider: Send + Sync {
    /// Order is the engine's per-tick priority.
    fn list_active_projects(&self) -> Vec<Project>;

    fn project_state_manager(&self, project_id: quorum_core::ProjectId) -> Option<Arc<dyn KanbanStateManager>>;

    fn project_event_bus(&self, project_id: quorum_core::ProjectId) -> Option<Arc<EventBus>>;

    fn project_execution_context(&self, base: &ExecutionContext, project_id: quorum_core::ProjectId) -> ExecutionContext {
        let mut ctx = base.clone();
        ctx.project_id = Some(project_id);
        ctx
    }
}
