// SPDX-License-Identifier: MIT

//! Process-wide kanban engine state, persisted on every transition.

use crate::ids::WorkflowId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub enabled: bool,
    #[serde(default)]
    pub current_workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub circuit_breaker_open: bool,
    #[serde(default)]
    pub last_failure_at_epoch_ms: Option<u64>,
}

impl EngineState {
    pub fn is_idle(&self) -> bool {
        self.current_workflow_id.is_none()
    }
}
