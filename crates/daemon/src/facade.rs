// SPDX-License-Identifier: MIT

//! The `Quorum` facade: one process's worth of wired-up components.

use quorum_adapters::{ProjectStateProvider, WorkflowExecutor};
use quorum_attachments::AttachmentStore;
use quorum_bus::EventBus;
use quorum_chat::ChatRegistry;
use quorum_engine::KanbanEngine;
use quorum_storage::ChatStore;
use std::fs::File;
use std::sync::Arc;

/// Everything C1–C7 wires together for one process. Held alive by the
/// caller for the process lifetime; dropping it releases the daemon lock.
pub struct Quorum<E, P>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
{
    pub bus: Arc<EventBus>,
    pub chat_store: Arc<ChatStore>,
    pub chat: Arc<ChatRegistry>,
    pub attachments: Arc<AttachmentStore>,
    pub kanban: Arc<KanbanEngine<E, P>>,
    #[allow(dead_code)]
    pub(crate) lock_file: File,
}

impl<E, P> std::fmt::Debug for Quorum<E, P>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quorum").finish_non_exhaustive()
    }
}
