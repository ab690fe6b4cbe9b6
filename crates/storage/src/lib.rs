// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quorum-storage: durable persistence — the chat store (rusqlite) and a
//! file-backed store for the kanban engine's own state.

mod chat_store;
mod engine_state_store;
mod error;
mod file_kanban_state_manager;
mod migrations;
mod retry;

pub use chat_store::{ChatStore, ChatStoreConfig};
pub use engine_state_store::{EngineStateStore, EngineStateStoreError};
pub use error::ChatStoreError;
pub use file_kanban_state_manager::FileKanbanStateManager;
