// SPDX-License-Identifier: MIT

//! Workflow state: the unit of work the kanban engine schedules.

use crate::ids::WorkflowId;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a workflow, distinct from its kanban column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    WorkflowStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// A workflow's position on the kanban board.
///
/// Transitions form a DAG: `Todo -> InProgress -> {ToVerify, Refinement}`,
/// `Refinement -> Todo` (external edit). The engine never produces any other
/// edge; `Refinement -> Todo` is performed by an external caller editing the
/// workflow, not by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    Todo,
    InProgress,
    ToVerify,
    Refinement,
}

crate::simple_display! {
    KanbanColumn {
        Todo => "todo",
        InProgress => "in_progress",
        ToVerify => "to_verify",
        Refinement => "refinement",
    }
}

impl KanbanColumn {
    /// Whether `self -> next` is an edge the engine itself is allowed to
    /// produce. `Refinement -> Todo` is excluded: that edge exists, but only
    /// an external caller (editing the workflow) may produce it.
    pub fn engine_may_transition_to(self, next: KanbanColumn) -> bool {
        matches!(
            (self, next),
            (KanbanColumn::Todo, KanbanColumn::InProgress)
                | (KanbanColumn::InProgress, KanbanColumn::ToVerify)
                | (KanbanColumn::InProgress, KanbanColumn::Refinement)
        )
    }
}

/// A user-submitted AI-driven job targeting a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: WorkflowId,
    pub title: String,
    pub status: WorkflowStatus,
    pub kanban_column: KanbanColumn,
    /// Lower position = earlier in the column's queue.
    pub kanban_position: i64,
    #[serde(default)]
    pub pr_url: Option<String>,
    #[serde(default)]
    pub pr_number: Option<u64>,
    #[serde(default)]
    pub workflow_branch: Option<String>,
    #[serde(default)]
    pub kanban_last_error: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Rolling tail of non-chunk agent events, bounded by
    /// `quorum_engine::notifier::MAX_AGENT_EVENTS`, retained for UI reload.
    #[serde(default)]
    pub agent_events: Vec<crate::agent_event::AgentEvent>,
}

crate::builder! {
    pub struct WorkflowStateBuilder => WorkflowState {
        into { title: String = "untitled workflow" }
        set { status: WorkflowStatus = WorkflowStatus::Pending }
        set { kanban_column: KanbanColumn = KanbanColumn::Todo }
        set { kanban_position: i64 = 0 }
        option { pr_url: String = None }
        option { pr_number: u64 = None }
        option { workflow_branch: String = None }
        option { kanban_last_error: String = None }
        option { error: String = None }
        computed { id: WorkflowId = WorkflowId::new() }
        computed { agent_events: Vec<crate::agent_event::AgentEvent> = Vec::new() }
    }
}

impl WorkflowState {
    /// Move to a new column and position, clearing `kanban_last_error` when
    /// leaving `Refinement` (a fresh attempt should not carry stale error text).
    pub fn move_to(&mut self, column: KanbanColumn, position: i64) {
        if self.kanban_column == KanbanColumn::Refinement && column != KanbanColumn::Refinement {
            self.kanban_last_error = None;
        }
        self.kanban_column = column;
        self.kanban_position = position;
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
