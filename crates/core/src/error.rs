// SPDX-License-Identifier: MIT

//! Shared error taxonomy kinds (§7 of the design). Each crate defines its
//! own `thiserror` enum for its operations; this module holds only the
//! pieces genuinely shared across crate boundaries.

use thiserror::Error;

/// A caller-visible "not found" marker, distinct from internal errors, used
/// by every component that looks entities up by ID (sessions, attachments,
/// workflows). Maps to 404 at the edge (out of scope here).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} not found: {id}")]
pub struct NotFound {
    pub kind: &'static str,
    pub id: String,
}

impl NotFound {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}

/// A size-limit violation, reported with the limit that was exceeded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{what} exceeds limit of {limit_bytes} bytes")]
pub struct TooLarge {
    pub what: &'static str,
    pub limit_bytes: u64,
}
