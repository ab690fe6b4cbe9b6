// SPDX-License-Identifier: MIT

//! Persisted agent events: the bounded rolling trace retained per workflow
//! for UI reload after a browser refresh or reconnect.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single agent event as persisted on `WorkflowState.agent_events`.
///
/// `chunk`-typed events are published on the bus but never reach this type —
/// the progress notifier filters them out before appending to the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    /// `<unix-nanos>-<agent>`, unique within a workflow. See
    /// [`AgentEvent::make_id`] for the generation rule.
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub agent: String,
    pub message: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    pub timestamp_epoch_ms: u64,
    pub execution_id: String,
}

impl AgentEvent {
    /// Builds the `<unix-nanos>-<agent>` ID. Callers without a nanosecond
    /// clock may pass any monotonically increasing `nanos_hint` (e.g. a
    /// local counter) — only uniqueness within a workflow is required.
    pub fn make_id(nanos_hint: u128, agent: &str) -> String {
        format!("{nanos_hint}-{agent}")
    }

    pub fn is_chunk(&self) -> bool {
        self.event_type == "chunk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_id_embeds_agent_name() {
        let id = AgentEvent::make_id(42, "claude");
        assert_eq!(id, "42-claude");
    }

    #[test]
    fn is_chunk_detects_chunk_type() {
        let ev = AgentEvent {
            id: "1-a".into(),
            event_type: "chunk".into(),
            agent: "a".into(),
            message: String::new(),
            data: HashMap::new(),
            timestamp_epoch_ms: 0,
            execution_id: "e".into(),
        };
        assert!(ev.is_chunk());
    }
}
