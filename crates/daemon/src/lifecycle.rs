// SPDX-License-Identifier: MIT

//! Process startup and shutdown: acquire the daemon lock, create the state
//! directories, wire the durable stores, and build the [`Quorum`] facade.
//! No socket, no WAL replay — every store here is durable on write, so
//! there is nothing to recover at startup beyond what `ChatStore::open` and
//! `FileKanbanStateManager::open` already do internally.

use crate::config::Config;
use crate::facade::Quorum;
use quorum_adapters::{AgentRegistry, KanbanError, ProjectStateProvider, WorkflowExecutor};
use quorum_attachments::{AttachmentConfig, AttachmentStore};
use quorum_bus::{BusConfig, EventBus};
use quorum_chat::{ChatRegistry, ChatRegistryConfig};
use quorum_engine::{EngineConfig, KanbanEngine};
use quorum_storage::{ChatStore, ChatStoreConfig, ChatStoreError, FileKanbanStateManager};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use fs2::FileExt;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not resolve a state directory (set QUORUM_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("another quorum process already holds the lock at {0}")]
    LockHeld(PathBuf),

    #[error(transparent)]
    ChatStore(#[from] ChatStoreError),

    #[error(transparent)]
    Kanban(#[from] KanbanError),
}

/// Installs a `tracing-subscriber` fmt layer honoring `RUST_LOG`, defaulting
/// to `info`. Safe to call once per process; a second call is a no-op error
/// that this function swallows, since tests may initialize it repeatedly.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Brings up one daemon process: acquires the lock file first (so a second
/// instance fails fast), creates the state directories, then wires the bus,
/// chat store/registry, attachment store, and kanban engine around the
/// caller-supplied executor/project-provider/agent-registry collaborators.
pub fn startup<E, P>(config: &Config, executor: Arc<E>, projects: Arc<P>, agents: Arc<dyn AgentRegistry>) -> Result<Quorum<E, P>, LifecycleError>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
{
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(|_| LifecycleError::LockHeld(config.lock_path.clone()))?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::create_dir_all(&config.kanban_dir)?;

    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let chat_store = Arc::new(ChatStore::open(ChatStoreConfig { path: config.chat_db_path.clone() })?);
    let attachments = Arc::new(AttachmentStore::new(AttachmentConfig { root: config.attachments_root.clone() }));
    let chat = Arc::new(
        ChatRegistry::new(chat_store.clone(), ChatRegistryConfig::default())
            .with_agents(agents)
            .with_attachments(attachments.clone())
            .with_bus(bus.clone()),
    );

    let legacy_manager = Arc::new(FileKanbanStateManager::open(&config.kanban_dir)?);
    let kanban = Arc::new(KanbanEngine::new(executor, projects, bus.clone(), EngineConfig::default()).with_legacy_manager(legacy_manager));

    info!(state_dir = %config.state_dir.display(), "quorum daemon started");
    Ok(Quorum { bus, chat_store, chat, attachments, kanban, lock_file })
}

/// Disables the kanban engine and removes the lock file. The lock is also
/// released when `quorum` drops (its `File` is closed), but removing the
/// path lets a later `startup` reuse it without waiting on the OS to notice.
pub fn shutdown<E, P>(quorum: &Quorum<E, P>, config: &Config) -> Result<(), LifecycleError>
where
    E: WorkflowExecutor + 'static,
    P: ProjectStateProvider + 'static,
{
    info!("shutting down quorum daemon");
    quorum.kanban.disable();
    if config.lock_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.lock_path) {
            warn!(error = %e, "failed to remove lock file");
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
