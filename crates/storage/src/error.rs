// SPDX-License-Identifier: MIT

use quorum_core::NotFound;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatStoreError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error("database busy after retrying")]
    Busy,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}
