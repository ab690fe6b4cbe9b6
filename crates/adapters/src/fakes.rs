// SPDX-License-Identifier: MIT

//! Test doubles for the external-interface traits, gated behind
//! `test-support` so other crates can depend on them in `dev-dependencies`
//! without pulling them into production builds.

use crate::agent::{Agent, AgentError, AgentRegistry, AgentRequest, AgentResponse};
use crate::executor::{ExecutorError, WorkflowExecutor};
use crate::project::{ExecutionContext, KanbanError, KanbanStateManager, Project, ProjectStateProvider};
use async_trait::async_trait;
use parking_lot::Mutex;
use quorum_bus::EventBus;
use quorum_core::{EngineState, Event, EventKind, KanbanColumn, NotFound, ProjectId, WorkflowId, WorkflowState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Always succeeds with a canned response; records every prompt it saw.
pub struct FakeAgent {
    pub response: AgentResponse,
    pub calls: Mutex<Vec<AgentRequest>>,
}

impl FakeAgent {
    pub fn new(output: impl Into<String>) -> Self {
        Self { response: AgentResponse { output: output.into(), tokens_in: 10, tokens_out: 20, cost_usd: 0.01, duration: Duration::from_millis(1) }, calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Agent for FakeAgent {
    async fn execute(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        self.calls.lock().push(request);
        Ok(self.response.clone())
    }
}

#[derive(Default)]
pub struct FakeAgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl FakeAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        self.agents.insert(name.into(), agent);
        self
    }
}

#[async_trait]
impl AgentRegistry for FakeAgentRegistry {
    fn get(&self, name: &str) -> Result<Arc<dyn Agent>, AgentError> {
        self.agents.get(name).cloned().ok_or_else(|| AgentError::NotFound(name.to_string()))
    }

    fn list(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    async fn available(&self) -> Vec<String> {
        self.list()
    }

    async fn available_for_phase(&self, _phase: &str) -> Vec<String> {
        self.list()
    }
}

/// Executor whose outcome for each workflow is preconfigured: either an
/// early (synchronous) failure, or a success/async-failure that publishes
/// the matching terminal event on the configured bus before `run` returns
/// `Ok(())` — standing in for a real executor's detached completion.
pub struct FakeExecutor {
    bus: Arc<EventBus>,
    early_failures: Mutex<HashMap<WorkflowId, String>>,
    async_failures: Mutex<HashMap<WorkflowId, String>>,
}

impl FakeExecutor {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus, early_failures: Mutex::new(HashMap::new()), async_failures: Mutex::new(HashMap::new()) }
    }

    pub fn fail_early(&self, id: WorkflowId, message: impl Into<String>) {
        self.early_failures.lock().insert(id, message.into());
    }

    pub fn fail_async(&self, id: WorkflowId, message: impl Into<String>) {
        self.async_failures.lock().insert(id, message.into());
    }
}

#[async_trait]
impl WorkflowExecutor for FakeExecutor {
    async fn run(&self, ctx: &ExecutionContext, workflow_id: WorkflowId) -> Result<(), ExecutorError> {
        if let Some(message) = self.early_failures.lock().remove(&workflow_id) {
            return Err(ExecutorError::Validation(message));
        }
        let kind = match self.async_failures.lock().remove(&workflow_id) {
            Some(error) => EventKind::WorkflowFailed { error },
            None => EventKind::WorkflowCompleted { pr_url: None, pr_number: None },
        };
        self.bus.publish_priority(Event::new(0, workflow_id, ctx.project_id, kind)).await;
        Ok(())
    }
}

/// In-process `KanbanStateManager` for one project, backed by a plain
/// `Vec`. Suitable for tests and for the "legacy single-project" path.
pub struct InMemoryKanbanStateManager {
    workflows: Mutex<Vec<WorkflowState>>,
    engine_state: Mutex<EngineState>,
}

impl InMemoryKanbanStateManager {
    pub fn new(workflows: Vec<WorkflowState>) -> Self {
        Self { workflows: Mutex::new(workflows), engine_state: Mutex::new(EngineState::default()) }
    }
}

impl KanbanStateManager for InMemoryKanbanStateManager {
    fn load_by_id(&self, id: WorkflowId) -> Result<WorkflowState, KanbanError> {
        self.workflows.lock().iter().find(|w| w.id == id).cloned().ok_or_else(|| NotFound::new("workflow", id.as_str()).into())
    }

    fn get_next_kanban_workflow(&self) -> Option<WorkflowState> {
        self.workflows.lock().iter().filter(|w| w.kanban_column == KanbanColumn::Todo).min_by_key(|w| w.kanban_position).cloned()
    }

    fn move_workflow(&self, id: WorkflowId, column: KanbanColumn, position: i64) -> Result<(), KanbanError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.iter_mut().find(|w| w.id == id).ok_or_else(|| NotFound::new("workflow", id.as_str()))?;
        workflow.move_to(column, position);
        Ok(())
    }

    fn update_kanban_status(&self, id: WorkflowId, column: KanbanColumn, pr_url: Option<String>, pr_number: Option<u64>, error: String) -> Result<(), KanbanError> {
        let mut workflows = self.workflows.lock();
        let workflow = workflows.iter_mut().find(|w| w.id == id).ok_or_else(|| NotFound::new("workflow", id.as_str()))?;
        workflow.move_to(column, 0);
        if pr_url.is_some() {
            workflow.pr_url = pr_url;
        }
        if pr_number.is_some() {
            workflow.pr_number = pr_number;
        }
        if !error.is_empty() {
            workflow.kanban_last_error = Some(error);
        }
        Ok(())
    }

    fn get_kanban_engine_state(&self) -> EngineState {
        self.engine_state.lock().clone()
    }

    fn save_kanban_engine_state(&self, state: &EngineState) -> Result<(), KanbanError> {
        *self.engine_state.lock() = state.clone();
        Ok(())
    }
}

/// Single-project `ProjectStateProvider` wrapping one manager and one bus.
pub struct FakeProjectStateProvider {
    project: Project,
    manager: Arc<dyn KanbanStateManager>,
    bus: Arc<EventBus>,
}

impl FakeProjectStateProvider {
    pub fn new(project: Project, manager: Arc<dyn KanbanStateManager>, bus: Arc<EventBus>) -> Self {
        Self { project, manager, bus }
    }
}

impl ProjectStateProvider for FakeProjectStateProvider {
    fn list_active_projects(&self) -> Vec<Project> {
        vec![self.project.clone()]
    }

    fn project_state_manager(&self, project_id: ProjectId) -> Option<Arc<dyn KanbanStateManager>> {
        (project_id == self.project.id).then(|| self.manager.clone())
    }

    fn project_event_bus(&self, project_id: ProjectId) -> Option<Arc<EventBus>> {
        (project_id == self.project.id).then(|| self.bus.clone())
    }
}
