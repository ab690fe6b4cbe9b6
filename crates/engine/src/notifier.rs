// SPDX-License-Identifier: MIT

//! The executor-facing callback surface: every callback maps to a typed
//! [`Event`] published on the bus. Lifecycle terminals (`workflow_completed`,
//! `workflow_failed`) go out on the priority lane; everything else rides the
//! standard ring-buffer lane.
//!
//! Non-chunk `agent_event` callbacks also append to a bounded in-memory
//! trace and trigger a debounced background save, so a UI reload can replay
//! recent agent activity without replaying every event the bus ever saw.

use parking_lot::Mutex;
use quorum_core::{AgentEvent, Clock, EventKind, ProjectId, SystemClock, WorkflowId};
use quorum_bus::EventBus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

/// Cap on the rolling `agent_events` tail retained per workflow.
pub const MAX_AGENT_EVENTS: usize = 500;
const SAVE_THROTTLE: Duration = Duration::from_secs(2);
const SAVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("state save failed: {0}")]
    Save(String),
    #[error("state save timed out")]
    Timeout,
}

/// Persists a workflow's rolling agent-event trace. Implemented by whatever
/// owns the workflow's durable record (a `KanbanStateManager`, typically).
pub trait StateSaver: Send + Sync {
    fn save(&self, workflow_id: WorkflowId, agent_events: Vec<AgentEvent>) -> Result<(), NotifierError>;
}

struct Trace<S: StateSaver> {
    saver: Arc<S>,
    events: Mutex<Vec<AgentEvent>>,
    dirty: AtomicBool,
    last_saved_at: Mutex<Option<std::time::Instant>>,
    pending_timer: Mutex<Option<JoinHandle<()>>>,
}

/// Publishes typed lifecycle/progress events for one workflow execution, and
/// optionally maintains its rolling agent-event trace.
pub struct ProgressNotifier<S: StateSaver + 'static, C: Clock = SystemClock> {
    bus: Arc<EventBus>,
    project_id: Option<ProjectId>,
    workflow_id: WorkflowId,
    clock: C,
    trace: Option<Arc<Trace<S>>>,
}

impl<S: StateSaver + 'static> ProgressNotifier<S, SystemClock> {
    pub fn new(bus: Arc<EventBus>, project_id: Option<ProjectId>, workflow_id: WorkflowId) -> Self {
        Self::with_clock(bus, project_id, workflow_id, SystemClock)
    }
}

impl<S: StateSaver + 'static, C: Clock> ProgressNotifier<S, C> {
    pub fn with_clock(bus: Arc<EventBus>, project_id: Option<ProjectId>, workflow_id: WorkflowId, clock: C) -> Self {
        Self { bus, project_id, workflow_id, clock, trace: None }
    }

    /// Enables rolling-trace persistence through `saver`.
    pub fn with_trace(mut self, saver: Arc<S>) -> Self {
        self.trace = Some(Arc::new(Trace { saver, events: Mutex::new(Vec::new()), dirty: AtomicBool::new(false), last_saved_at: Mutex::new(None), pending_timer: Mutex::new(None) }));
        self
    }

    fn publish(&self, kind: EventKind) {
        let event = quorum_core::Event::new(self.clock.epoch_ms(), self.workflow_id, self.project_id, kind);
        self.bus.publish(event);
    }

    async fn publish_priority(&self, kind: EventKind) {
        let event = quorum_core::Event::new(self.clock.epoch_ms(), self.workflow_id, self.project_id, kind);
        self.bus.publish_priority(event).await;
    }

    pub fn phase_started(&self, phase: impl Into<String>) {
        self.publish(EventKind::PhaseStarted { phase: phase.into() });
    }

    pub fn phase_completed(&self, phase: impl Into<String>) {
        self.publish(EventKind::PhaseCompleted { phase: phase.into() });
    }

    pub fn task_started(&self, task_id: impl Into<String>) {
        self.publish(EventKind::TaskStarted { task_id: task_id.into() });
    }

    pub fn task_completed(&self, task_id: impl Into<String>) {
        self.publish(EventKind::TaskCompleted { task_id: task_id.into() });
    }

    pub fn task_failed(&self, task_id: impl Into<String>, error: impl Into<String>) {
        self.publish(EventKind::TaskFailed { task_id: task_id.into(), error: error.into() });
    }

    pub fn task_skipped(&self, task_id: impl Into<String>, reason: Option<String>) {
        self.publish(EventKind::TaskSkipped { task_id: task_id.into(), reason });
    }

    pub fn workflow_state_updated(&self, column: quorum_core::KanbanColumn, position: i64) {
        self.publish(EventKind::WorkflowStateUpdated { column, position });
    }

    pub fn log(&self, level: impl Into<String>, message: impl Into<String>) {
        self.publish(EventKind::Log { level: level.into(), message: message.into() });
    }

    pub fn workflow_started(&self) {
        self.publish(EventKind::WorkflowStarted);
    }

    pub async fn workflow_completed(&self, pr_url: Option<String>, pr_number: Option<u64>) {
        self.publish_priority(EventKind::WorkflowCompleted { pr_url, pr_number }).await;
    }

    pub async fn workflow_failed(&self, error: impl Into<String>) {
        self.publish_priority(EventKind::WorkflowFailed { error: error.into() }).await;
    }

    /// Publishes the event unconditionally; non-chunk events also extend the
    /// rolling trace and schedule a debounced save.
    pub fn agent_event(&self, event: AgentEvent) {
        let is_chunk = event.is_chunk();
        self.publish(EventKind::AgentEvent { agent_event: event.clone() });
        if is_chunk {
            return;
        }
        let Some(trace) = self.trace.clone() else { return };
        {
            let mut events = trace.events.lock();
            events.push(event);
            if events.len() > MAX_AGENT_EVENTS {
                let drop_count = events.len() - MAX_AGENT_EVENTS;
                events.drain(0..drop_count);
            }
        }
        trace.dirty.store(true, Ordering::SeqCst);
        self.maybe_save(trace);
    }

    fn maybe_save(&self, trace: Arc<Trace<S>>) {
        let last_saved_at: Option<std::time::Instant> = *trace.last_saved_at.lock();
        let elapsed = last_saved_at.map(|at| at.elapsed());
        let due = elapsed.map_or(true, |e| e >= SAVE_THROTTLE);
        if due {
            spawn_save(self.workflow_id, trace);
            return;
        }
        if trace.pending_timer.lock().is_some() {
            return;
        }
        let remaining = SAVE_THROTTLE.saturating_sub(elapsed.unwrap_or_default());
        let workflow_id = self.workflow_id;
        let timer_trace = trace.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            timer_trace.pending_timer.lock().take();
            if timer_trace.dirty.load(Ordering::SeqCst) {
                spawn_save(workflow_id, timer_trace);
            }
        });
        *trace.pending_timer.lock() = Some(handle);
    }

    /// Cancels any pending debounce timer and saves synchronously, ignoring
    /// the throttle window. Call before the workflow's executor returns so
    /// the final trace is durable even if the debounce window never fires.
    pub async fn flush_state(&self) {
        let Some(trace) = self.trace.clone() else { return };
        if let Some(handle) = trace.pending_timer.lock().take() {
            handle.abort();
        }
        if !trace.dirty.load(Ordering::SeqCst) {
            return;
        }
        let events = trace.events.lock().clone();
        let saver = trace.saver.clone();
        let workflow_id = self.workflow_id;
        let result = tokio::time::timeout(SAVE_TIMEOUT, tokio::task::spawn_blocking(move || saver.save(workflow_id, events))).await;
        match result {
            Ok(Ok(Ok(()))) => {
                trace.dirty.store(false, Ordering::SeqCst);
                *trace.last_saved_at.lock() = Some(std::time::Instant::now());
            }
            Ok(Ok(Err(err))) => warn!(%workflow_id, error = %err, "flush_state save failed"),
            Ok(Err(join_err)) => warn!(%workflow_id, error = %join_err, "flush_state save task panicked"),
            Err(_) => warn!(%workflow_id, "flush_state save timed out"),
        }
    }
}

fn spawn_save<S: StateSaver + 'static>(workflow_id: WorkflowId, trace: Arc<Trace<S>>) {
    *trace.last_saved_at.lock() = Some(std::time::Instant::now());
    let events = trace.events.lock().clone();
    let saver = trace.saver.clone();
    tokio::spawn(async move {
        let result = tokio::time::timeout(SAVE_TIMEOUT, tokio::task::spawn_blocking(move || saver.save(workflow_id, events))).await;
        match result {
            Ok(Ok(Ok(()))) => trace.dirty.store(false, Ordering::SeqCst),
            Ok(Ok(Err(err))) => warn!(%workflow_id, error = %err, "debounced save failed"),
            Ok(Err(join_err)) => warn!(%workflow_id, error = %join_err, "debounced save task panicked"),
            Err(_) => warn!(%workflow_id, "debounced save timed out"),
        }
    });
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
