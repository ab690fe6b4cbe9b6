// SPDX-License-Identifier: MIT

//! The closed set of events that flow through the bus.
//!
//! Every event carries the same envelope (`type`, `timestamp`, `workflow_id`,
//! `project_id`) plus variant-specific fields — the stable wire contract for
//! SSE consumers (out of scope here; this is the shape they would see).
//! Dispatch at handlers inspects `EventKind`'s tag rather than relying on
//! open inheritance.

use crate::agent_event::AgentEvent;
use crate::ids::{ProjectId, SessionId, WorkflowId};
use crate::workflow::KanbanColumn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Envelope shared by every event on the bus.
///
/// `project_id` is `None` for events with no project affiliation (global
/// broadcast); the bus treats that the same way it treats a subscriber's
/// empty project filter — see [`crate::event::Event::matches_project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp_epoch_ms: u64,
    pub workflow_id: WorkflowId,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    pub fn new(
        timestamp_epoch_ms: u64,
        workflow_id: WorkflowId,
        project_id: Option<ProjectId>,
        kind: EventKind,
    ) -> Self {
        Self { timestamp_epoch_ms, workflow_id, project_id, kind }
    }

    /// Filtering rule shared by `Subscribe`/`SubscribePriority`: a `None`
    /// subscriber filter matches every event; otherwise the project ids
    /// must match exactly.
    pub fn matches_project(&self, filter: Option<ProjectId>) -> bool {
        match filter {
            None => true,
            Some(want) => self.project_id == Some(want),
        }
    }

    /// The stable string tag for this event's kind, e.g. `"kanban_workflow_moved"`.
    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }
}

/// Tagged variant carrying the event-specific fields.
///
/// Serializes with `{"type": "event_name", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    #[serde(rename = "workflow_started")]
    WorkflowStarted,

    #[serde(rename = "workflow_state_updated")]
    WorkflowStateUpdated { column: KanbanColumn, position: i64 },

    #[serde(rename = "workflow_completed")]
    WorkflowCompleted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_number: Option<u64>,
    },

    #[serde(rename = "workflow_failed")]
    WorkflowFailed { error: String },

    #[serde(rename = "workflow_paused")]
    WorkflowPaused,

    #[serde(rename = "workflow_resumed")]
    WorkflowResumed,

    #[serde(rename = "phase_started")]
    PhaseStarted { phase: String },

    #[serde(rename = "phase_completed")]
    PhaseCompleted { phase: String },

    #[serde(rename = "task_created")]
    TaskCreated { task_id: String, name: String },

    #[serde(rename = "task_started")]
    TaskStarted { task_id: String },

    #[serde(rename = "task_progress")]
    TaskProgress {
        task_id: String,
        progress: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    #[serde(rename = "task_completed")]
    TaskCompleted { task_id: String },

    #[serde(rename = "task_failed")]
    TaskFailed { task_id: String, error: String },

    #[serde(rename = "task_skipped")]
    TaskSkipped {
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    #[serde(rename = "task_retry")]
    TaskRetry { task_id: String, attempt: u32 },

    #[serde(rename = "agent_event")]
    AgentEvent { agent_event: AgentEvent },

    #[serde(rename = "log")]
    Log { level: String, message: String },

    #[serde(rename = "metrics_update")]
    MetricsUpdate { metrics: HashMap<String, serde_json::Value> },

    #[serde(rename = "chat_message_received")]
    ChatMessageReceived { session_id: SessionId, message_id: crate::ids::MessageId },

    #[serde(rename = "user_input_requested")]
    UserInputRequested { prompt: String },

    #[serde(rename = "user_input_provided")]
    UserInputProvided { input: String },

    #[serde(rename = "kanban_workflow_moved")]
    KanbanWorkflowMoved { from: KanbanColumn, to: KanbanColumn },

    #[serde(rename = "kanban_execution_started")]
    KanbanExecutionStarted,

    #[serde(rename = "kanban_execution_completed")]
    KanbanExecutionCompleted,

    #[serde(rename = "kanban_execution_failed")]
    KanbanExecutionFailed { error: String, consecutive_failures: u32 },

    #[serde(rename = "kanban_engine_state_changed")]
    KanbanEngineStateChanged { enabled: bool, circuit_breaker_open: bool },

    #[serde(rename = "kanban_circuit_breaker_opened")]
    KanbanCircuitBreakerOpened { failures: u32, threshold: u32, last_failure_at_epoch_ms: u64 },

    #[serde(rename = "control_pause")]
    ControlPause,

    #[serde(rename = "control_resume")]
    ControlResume,

    #[serde(rename = "control_abort")]
    ControlAbort,

    #[serde(rename = "control_retry")]
    ControlRetry,

    #[serde(rename = "control_skip")]
    ControlSkip,

    /// Catch-all for unknown type tags (extensibility).
    #[serde(other)]
    Custom,
}

impl EventKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            EventKind::WorkflowStarted => "workflow_started",
            EventKind::WorkflowStateUpdated { .. } => "workflow_state_updated",
            EventKind::WorkflowCompleted { .. } => "workflow_completed",
            EventKind::WorkflowFailed { .. } => "workflow_failed",
            EventKind::WorkflowPaused => "workflow_paused",
            EventKind::WorkflowResumed => "workflow_resumed",
            EventKind::PhaseStarted { .. } => "phase_started",
            EventKind::PhaseCompleted { .. } => "phase_completed",
            EventKind::TaskCreated { .. } => "task_created",
            EventKind::TaskStarted { .. } => "task_started",
            EventKind::TaskProgress { .. } => "task_progress",
            EventKind::TaskCompleted { .. } => "task_completed",
            EventKind::TaskFailed { .. } => "task_failed",
            EventKind::TaskSkipped { .. } => "task_skipped",
            EventKind::TaskRetry { .. } => "task_retry",
            EventKind::AgentEvent { .. } => "agent_event",
            EventKind::Log { .. } => "log",
            EventKind::MetricsUpdate { .. } => "metrics_update",
            EventKind::ChatMessageReceived { .. } => "chat_message_received",
            EventKind::UserInputRequested { .. } => "user_input_requested",
            EventKind::UserInputProvided { .. } => "user_input_provided",
            EventKind::KanbanWorkflowMoved { .. } => "kanban_workflow_moved",
            EventKind::KanbanExecutionStarted => "kanban_execution_started",
            EventKind::KanbanExecutionCompleted => "kanban_execution_completed",
            EventKind::KanbanExecutionFailed { .. } => "kanban_execution_failed",
            EventKind::KanbanEngineStateChanged { .. } => "kanban_engine_state_changed",
            EventKind::KanbanCircuitBreakerOpened { .. } => "kanban_circuit_breaker_opened",
            EventKind::ControlPause => "control_pause",
            EventKind::ControlResume => "control_resume",
            EventKind::ControlAbort => "control_abort",
            EventKind::ControlRetry => "control_retry",
            EventKind::ControlSkip => "control_skip",
            EventKind::Custom => "custom",
        }
    }

    /// Is this a lifecycle-terminal event the engine listens for?
    pub fn is_workflow_completed(&self) -> bool {
        matches!(self, EventKind::WorkflowCompleted { .. })
    }

    pub fn is_workflow_failed(&self) -> bool {
        matches!(self, EventKind::WorkflowFailed { .. })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
