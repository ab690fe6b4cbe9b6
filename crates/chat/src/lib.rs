// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quorum-chat: the in-memory session registry fronting the durable chat
//! store, plus `@file` prompt assembly for `SendMessage`.

mod error;
mod file_context;
mod prompt;
mod registry;

pub use error::{ChatRegistryError, FileContextError};
pub use file_context::{read_file_in_project, MAX_FILE_BYTES};
pub use prompt::{extract_file_references, DEFAULT_SYSTEM_PROMPT};
pub use registry::{ChatRegistry, ChatRegistryConfig, SendMessageRequest};
