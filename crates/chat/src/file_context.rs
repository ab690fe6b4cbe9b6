// SPDX-License-Identifier: MIT

//! Reads `@file.ext` references for prompt construction. Every read is
//! rooted at the project directory: the resolved path must canonicalize to
//! somewhere underneath it, or the reference is rejected rather than
//! followed outside the project (symlinks included, since canonicalization
//! resolves them).

use crate::error::FileContextError;
use quorum_core::TooLarge;
use std::path::Path;

pub const MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

pub fn read_file_in_project(project_root: &Path, relative: &str) -> Result<String, FileContextError> {
    let io_err = |source: std::io::Error| FileContextError::Io { path: relative.to_string(), source };

    let root = project_root.canonicalize().map_err(io_err)?;
    let candidate = root.join(relative);
    let resolved = candidate.canonicalize().map_err(io_err)?;
    if !resolved.starts_with(&root) {
        return Err(FileContextError::Breakout(relative.to_string()));
    }

    let metadata = std::fs::metadata(&resolved).map_err(io_err)?;
    if metadata.is_dir() {
        return Err(FileContextError::IsDirectory(relative.to_string()));
    }
    if metadata.len() > MAX_FILE_BYTES {
        return Err(TooLarge { what: "attached file", limit_bytes: MAX_FILE_BYTES }.into());
    }

    let bytes = std::fs::read(&resolved).map_err(io_err)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
