// SPDX-License-Identifier: MIT

//! File-backed `KanbanStateManager`: one JSON file per project directory
//! (`workflows.json`) plus the shared [`EngineStateStore`] for engine-level
//! bookkeeping. The reference implementation the kanban engine can run
//! against outside of tests; atomic temp+rename writes, same as
//! [`EngineStateStore`] and the attachment store's `meta.json`.

use crate::engine_state_store::EngineStateStore;
use parking_lot::Mutex;
use quorum_adapters::{KanbanError, KanbanStateManager};
use quorum_core::{EngineState, KanbanColumn, NotFound, WorkflowId, WorkflowState};
use std::path::{Path, PathBuf};

pub struct FileKanbanStateManager {
    workflows_path: PathBuf,
    workflows: Mutex<Vec<WorkflowState>>,
    engine_state: EngineStateStore,
}

impl FileKanbanStateManager {
    /// Loads `workflows.json` and `engine_state.json` from `dir`, creating
    /// an empty board if neither exists yet.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, KanbanError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(persistence)?;
        let workflows_path = dir.join("workflows.json");
        let workflows = load_workflows(&workflows_path)?;
        Ok(Self { workflows_path, workflows: Mutex::new(workflows), engine_state: EngineStateStore::new(dir.join("engine_state.json")) })
    }

    fn save(&self, workflows: &[WorkflowState]) -> Result<(), KanbanError> {
        let body = serde_json::to_vec_pretty(workflows).map_err(|e| KanbanError::Persistence(e.to_string()))?;
        write_atomically(&self.workflows_path, &body).map_err(persistence)
    }
}

fn load_workflows(path: &Path) -> Result<Vec<WorkflowState>, KanbanError> {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| KanbanError::Persistence(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(persistence(e)),
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}

fn persistence(e: std::io::Error) -> KanbanError {
    KanbanError::Persistence(e.to_string())
}

impl KanbanStateManager for FileKanbanStateManager {
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
        self.save(&workflows)
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
        self.save(&workflows)
    }

    fn get_kanban_engine_state(&self) -> EngineState {
        self.engine_state.load().unwrap_or_default()
    }

    fn save_kanban_engine_state(&self, state: &EngineState) -> Result<(), KanbanError> {
        self.engine_state.save(state).map_err(|e| KanbanError::Persistence(e.to_string()))
    }
}
