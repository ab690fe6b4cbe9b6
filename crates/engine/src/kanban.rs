// SPDX-License-Identifier: MIT

//! The sequential scheduler: picks at most one `todo` workflow at a time
//! from any active project, drives it through the kanban columns, reacts to
//! its terminal event, and keeps [`EngineState`] durable across restarts.
//!
//! State machine (engine level):
//!
//! ```text
//!      disabled ──enable()──▶ enabled ──tick finds workflow──▶ running
//!         ▲                      │                               │
//!         │                      └──circuit breaker trips────────┤
//!         │                                                     failure/completion
//!         └───────────────────────────────────────────────────────┘
//! ```
//!
//! When the breaker opens, `enabled` is forced false and [`KanbanEngine::enable`]
//! refuses until [`KanbanEngine::reset_circuit_breaker`] is called.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerState};
use crate::error::EngineError;
use quorum_adapters::{ExecutionContext, KanbanStateManager, ProjectStateProvider, WorkflowExecutor};
use quorum_bus::EventBus;
use quorum_core::{Clock, EngineState, Event, EventKind, KanbanColumn, ProjectId, SystemClock, WorkflowId, WorkflowStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct CurrentExecution {
    workflow_id: WorkflowId,
    project_id: Option<ProjectId>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tick_interval: Duration,
    pub circuit_breaker_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_secs(5), circuit_breaker_threshold: 2 }
    }
}

pub struct KanbanEngine<E, P, C: Clock = SystemClock> {
    executor: Arc<E>,
    projects: Arc<P>,
    bus: Arc<EventBus>,
    legacy_manager: Option<Arc<dyn KanbanStateManager>>,
    circuit_breaker: CircuitBreaker<C>,
    clock: C,
    tick_interval: Duration,
    enabled: AtomicBool,
    current: Mutex<Option<CurrentExecution>>,
}

impl<E, P> KanbanEngine<E, P, SystemClock>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
{
    pub fn new(executor: Arc<E>, projects: Arc<P>, bus: Arc<EventBus>, config: EngineConfig) -> Self {
        Self::with_clock(executor, projects, bus, config, SystemClock)
    }
}

impl<E, P, C> KanbanEngine<E, P, C>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
    C: Clock,
{
    pub fn with_clock(executor: Arc<E>, projects: Arc<P>, bus: Arc<EventBus>, config: EngineConfig, clock: C) -> Self {
        Self {
            executor,
            projects,
            bus,
            legacy_manager: None,
            circuit_breaker: CircuitBreaker::with_clock(config.circuit_breaker_threshold, clock.clone()),
            clock,
            tick_interval: config.tick_interval,
            enabled: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    /// Attaches a single-project state manager used ahead of the project
    /// provider — the pre-multi-project "legacy" deployment shape.
    pub fn with_legacy_manager(mut self, manager: Arc<dyn KanbanStateManager>) -> Self {
        self.legacy_manager = Some(manager);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.current.lock().is_none()
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker<C> {
        &self.circuit_breaker
    }

    pub fn enable(&self) -> Result<(), EngineError> {
        if self.circuit_breaker.is_open() {
            return Err(EngineError::CircuitOpen);
        }
        self.enabled.store(true, Ordering::SeqCst);
        self.publish_state_changed();
        Ok(())
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.publish_state_changed();
    }

    pub fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset();
    }

    fn publish_state_changed(&self) {
        self.bus.publish(Event::new(
            self.clock.epoch_ms(),
            WorkflowId::from_string(""),
            None,
            EventKind::KanbanEngineStateChanged { enabled: self.is_enabled(), circuit_breaker_open: self.circuit_breaker.is_open() },
        ));
    }

    fn resolve_manager(&self, project_id: Option<ProjectId>) -> Option<Arc<dyn KanbanStateManager>> {
        if let Some(legacy) = &self.legacy_manager {
            return Some(legacy.clone());
        }
        project_id.and_then(|id| self.projects.project_state_manager(id))
    }

    /// The manager used to persist [`EngineState`] itself: legacy-preferred,
    /// else the first project the provider lists.
    fn persistence_manager(&self) -> Option<Arc<dyn KanbanStateManager>> {
        if let Some(legacy) = &self.legacy_manager {
            return Some(legacy.clone());
        }
        self.projects.list_active_projects().into_iter().next().and_then(|p| self.projects.project_state_manager(p.id))
    }

    fn known_managers(&self) -> Vec<Arc<dyn KanbanStateManager>> {
        if let Some(legacy) = &self.legacy_manager {
            return vec![legacy.clone()];
        }
        self.projects.list_active_projects().into_iter().filter_map(|p| self.projects.project_state_manager(p.id)).collect()
    }

    fn snapshot_engine_state(&self) -> EngineState {
        let cb = self.circuit_breaker.get_state();
        EngineState {
            enabled: self.is_enabled(),
            current_workflow_id: self.current.lock().as_ref().map(|c| c.workflow_id),
            consecutive_failures: cb.consecutive_failures,
            circuit_breaker_open: cb.open,
            last_failure_at_epoch_ms: cb.last_failure_at_epoch_ms,
        }
    }

    fn persist_engine_state(&self) {
        let Some(manager) = self.persistence_manager() else { return };
        if let Err(err) = manager.save_kanban_engine_state(&self.snapshot_engine_state()) {
            warn!(error = %err, "failed to persist kanban engine state");
        }
    }

    fn bus_for(&self, project_id: Option<ProjectId>) -> Arc<EventBus> {
        project_id.and_then(|id| self.projects.project_event_bus(id)).unwrap_or_else(|| self.bus.clone())
    }

    /// Publishes on the project bus, mirroring to the global bus when they
    /// differ (backward compat for subscribers that only watch the global bus).
    fn publish_on_project_and_global(&self, project_bus: &Arc<EventBus>, event: Event) {
        project_bus.publish(event.clone());
        if !Arc::ptr_eq(project_bus, &self.bus) {
            self.bus.publish(event);
        }
    }

    /// Runs one scheduling pass: does nothing if disabled, tripped, or
    /// already executing; otherwise starts the first `todo` workflow found
    /// by iterating `ListActiveProjects()` in order.
    pub async fn tick(self: &Arc<Self>) {
        if !self.is_enabled() || self.circuit_breaker.is_open() || !self.is_idle() {
            return;
        }
        let projects = self.projects.list_active_projects();
        if projects.is_empty() {
            if let Some(manager) = self.legacy_manager.clone() {
                if let Some(workflow) = manager.get_next_kanban_workflow() {
                    self.start_workflow(None, manager, workflow.id).await;
                }
            }
            return;
        }
        for project in projects {
            let Some(manager) = self.projects.project_state_manager(project.id) else { continue };
            if let Some(workflow) = manager.get_next_kanban_workflow() {
                self.start_workflow(Some(project.id), manager, workflow.id).await;
                return;
            }
        }
    }

    async fn start_workflow(self: &Arc<Self>, project_id: Option<ProjectId>, manager: Arc<dyn KanbanStateManager>, workflow_id: WorkflowId) {
        if let Err(err) = manager.move_workflow(workflow_id, KanbanColumn::InProgress, 0) {
            warn!(%workflow_id, error = %err, "failed to move workflow to in_progress, skipping this tick");
            return;
        }
        *self.current.lock() = Some(CurrentExecution { workflow_id, project_id });
        self.persist_engine_state();

        let bus = self.bus_for(project_id);
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, project_id, EventKind::KanbanWorkflowMoved { from: KanbanColumn::Todo, to: KanbanColumn::InProgress }));
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, project_id, EventKind::KanbanExecutionStarted));

        let engine = self.clone();
        tokio::spawn(async move {
            let base_ctx = ExecutionContext::default();
            let ctx = match project_id {
                Some(id) => engine.projects.project_execution_context(&base_ctx, id),
                None => base_ctx,
            };
            if let Err(err) = engine.executor.run(&ctx, workflow_id).await {
                engine.handle_failure(workflow_id, err.to_string()).await;
            }
        });
    }

    /// Dispatches an incoming `workflow_completed`/`workflow_failed` event
    /// from the subscription the main loop holds.
    pub async fn handle_event(&self, event: Event) {
        match event.kind {
            EventKind::WorkflowCompleted { .. } => self.handle_completion(event.workflow_id).await,
            EventKind::WorkflowFailed { error } => self.handle_failure(event.workflow_id, error).await,
            _ => {}
        }
    }

    async fn handle_completion(&self, workflow_id: WorkflowId) {
        let current = *self.current.lock();
        let Some(current) = current else { return };
        if current.workflow_id != workflow_id {
            return;
        }
        if let Some(manager) = self.resolve_manager(current.project_id) {
            let (pr_url, pr_number) = match manager.load_by_id(workflow_id) {
                Ok(workflow) => (workflow.pr_url, workflow.pr_number),
                Err(err) => {
                    warn!(%workflow_id, error = %err, "failed to load workflow for completion, recording without PR info");
                    (None, None)
                }
            };
            if let Err(err) = manager.update_kanban_status(workflow_id, KanbanColumn::ToVerify, pr_url, pr_number, String::new()) {
                warn!(%workflow_id, error = %err, "failed to record workflow completion");
            }
        }
        self.circuit_breaker.record_success();
        *self.current.lock() = None;
        self.persist_engine_state();

        let bus = self.bus_for(current.project_id);
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, current.project_id, EventKind::KanbanWorkflowMoved { from: KanbanColumn::InProgress, to: KanbanColumn::ToVerify }));
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, current.project_id, EventKind::KanbanExecutionCompleted));
    }

    async fn handle_failure(&self, workflow_id: WorkflowId, error: String) {
        let current = *self.current.lock();
        let Some(current) = current else { return };
        if current.workflow_id != workflow_id {
            return;
        }
        if let Some(manager) = self.resolve_manager(current.project_id) {
            if let Err(err) = manager.update_kanban_status(workflow_id, KanbanColumn::Refinement, None, None, error.clone()) {
                warn!(%workflow_id, error = %err, "failed to record workflow failure");
            }
        }
        let tripped = self.circuit_breaker.record_failure();
        if tripped {
            self.enabled.store(false, Ordering::SeqCst);
        }
        *self.current.lock() = None;
        self.persist_engine_state();

        let bus = self.bus_for(current.project_id);
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, current.project_id, EventKind::KanbanWorkflowMoved { from: KanbanColumn::InProgress, to: KanbanColumn::Refinement }));
        self.publish_on_project_and_global(&bus, Event::new(self.clock.epoch_ms(), workflow_id, current.project_id, EventKind::KanbanExecutionFailed { error, consecutive_failures: self.circuit_breaker.consecutive_failures() }));
        if tripped {
            self.publish_on_project_and_global(
                &bus,
                Event::new(
                    self.clock.epoch_ms(),
                    workflow_id,
                    current.project_id,
                    EventKind::KanbanCircuitBreakerOpened { failures: self.circuit_breaker.consecutive_failures(), threshold: self.circuit_breaker.threshold(), last_failure_at_epoch_ms: self.circuit_breaker.last_failure_at().unwrap_or_else(|| self.clock.epoch_ms()) },
                ),
            );
        }
    }

    /// Reconciles persisted [`EngineState`] against current workflow status.
    /// Call once at startup, before the main loop begins ticking.
    pub async fn recover(&self) {
        let Some(manager) = self.persistence_manager() else { return };
        let state = manager.get_kanban_engine_state();
        self.circuit_breaker.set_state(CircuitBreakerState { consecutive_failures: state.consecutive_failures, open: state.circuit_breaker_open, last_failure_at_epoch_ms: state.last_failure_at_epoch_ms });
        self.enabled.store(state.enabled && !state.circuit_breaker_open, Ordering::SeqCst);

        let Some(workflow_id) = state.current_workflow_id else { return };
        let mut matches = Vec::new();
        for candidate in self.known_managers() {
            if let Ok(workflow) = candidate.load_by_id(workflow_id) {
                matches.push((candidate, workflow));
            }
        }
        if matches.len() > 1 {
            warn!(%workflow_id, candidates = matches.len(), "ambiguous engine-state recovery: workflow id present in multiple projects");
        }
        if let Some((manager, workflow)) = matches.into_iter().next() {
            let result = match workflow.status {
                WorkflowStatus::Completed => manager.update_kanban_status(workflow_id, KanbanColumn::ToVerify, workflow.pr_url.clone(), workflow.pr_number, String::new()),
                WorkflowStatus::Failed => manager.update_kanban_status(workflow_id, KanbanColumn::Refinement, None, None, workflow.error.clone().unwrap_or_default()),
                WorkflowStatus::Pending | WorkflowStatus::Running => manager.update_kanban_status(workflow_id, KanbanColumn::Refinement, None, None, "workflow interrupted during execution (server restart)".to_string()),
            };
            if let Err(err) = result {
                warn!(%workflow_id, error = %err, "failed to reconcile recovered workflow");
            }
        }
        *self.current.lock() = None;
        self.persist_engine_state();
    }

    /// The cooperative main loop: ticks on a timer, reacts to terminal
    /// events on the global bus, and on `stop` waits (bounded) for any
    /// in-flight execution to finish before returning.
    pub async fn run(self: Arc<Self>, mut stop: oneshot::Receiver<()>) {
        let terminal_types: std::collections::HashSet<String> = ["workflow_completed", "workflow_failed"].iter().map(|s| s.to_string()).collect();
        let (_, mut terminal_rx) = self.bus.subscribe(None, Some(terminal_types));
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                event = terminal_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => break,
                    }
                }
                _ = &mut stop => {
                    self.drain_on_shutdown(&mut terminal_rx).await;
                    break;
                }
            }
        }
    }

    async fn drain_on_shutdown(&self, terminal_rx: &mut quorum_bus::RingReceiver) {
        if self.is_idle() {
            return;
        }
        let deadline = tokio::time::sleep(SHUTDOWN_TIMEOUT);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                event = terminal_rx.recv() => {
                    match event {
                        Some(event) => {
                            self.handle_event(event).await;
                            if self.is_idle() {
                                return;
                            }
                        }
                        None => return,
                    }
                }
                _ = &mut deadline => {
                    warn!("shutdown timed out waiting for in-flight workflow to finish");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "kanban_tests.rs"]
mod tests;
