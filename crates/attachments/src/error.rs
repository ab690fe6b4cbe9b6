// SPDX-License-Identifier: MIT

use quorum_core::{NotFound, TooLarge};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    TooLarge(#[from] TooLarge),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt metadata: {0}")]
    CorruptMetadata(#[from] serde_json::Error),
}
