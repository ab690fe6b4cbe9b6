// SPDX-License-Identifier: MIT

//! File-backed persistence for the engine's own state (enabled flag,
//! current execution, circuit breaker bookkeeping). A JSON file with
//! atomic temp+rename writes, the same durability idiom as the attachment
//! store's `meta.json`.

use quorum_core::EngineState;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum EngineStateStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt engine state: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub struct EngineStateStore {
    path: PathBuf,
}

impl EngineStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default state if nothing has been persisted yet.
    pub fn load(&self) -> Result<EngineState, EngineStateStoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineState::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, state: &EngineState) -> Result<(), EngineStateStoreError> {
        write_atomically(&self.path, &serde_json::to_vec_pretty(state)?)?;
        Ok(())
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}
