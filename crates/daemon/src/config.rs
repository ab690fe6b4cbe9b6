// SPDX-License-Identifier: MIT

use crate::env;
use crate::lifecycle::LifecycleError;
use std::path::PathBuf;

/// Filesystem layout for one daemon process. All paths live under
/// [`state_dir`](Config::state_dir); nothing here is loaded from a config
/// file — that loading step is an external collaborator this crate doesn't
/// own.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub chat_db_path: PathBuf,
    pub attachments_root: PathBuf,
    pub kanban_dir: PathBuf,
}

impl Config {
    /// Resolves the user-level state directory and derives every other
    /// path from it. Does not create any directories; `startup` does that.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            lock_path: state_dir.join("quorum.pid"),
            chat_db_path: state_dir.join("chat.sqlite3"),
            attachments_root: state_dir.clone(),
            kanban_dir: state_dir.join("kanban"),
            state_dir,
        })
    }
}
