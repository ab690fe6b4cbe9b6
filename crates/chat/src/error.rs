// SPDX-License-Identifier: MIT

use quorum_adapters::AgentError;
use quorum_core::{NotFound, TooLarge};
use quorum_storage::ChatStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatRegistryError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("agent {0:?} is not registered")]
    UnknownAgent(String),

    #[error(transparent)]
    Store(#[from] ChatStoreError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

#[derive(Debug, Error)]
pub enum FileContextError {
    #[error("{0:?} does not resolve to a file inside the project root")]
    Breakout(String),

    #[error("{0:?} is a directory, not a file")]
    IsDirectory(String),

    #[error(transparent)]
    TooLarge(#[from] TooLarge),

    #[error("io error reading {path:?}: {source}")]
    Io { path: String, source: std::io::Error },
}
