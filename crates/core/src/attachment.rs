// SPDX-License-Identifier: MIT

//! Attachment metadata, shared by the attachment store and its callers
//! (chat and workflow components).

use crate::ids::AttachmentId;
use serde::{Deserialize, Serialize};

/// Closed set of owners an attachment can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerType {
    Chat,
    Workflows,
}

crate::simple_display! {
    OwnerType {
        Chat => "chat",
        Workflows => "workflows",
    }
}

impl OwnerType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(Self::Chat),
            "workflows" => Some(Self::Workflows),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    /// Sanitized filename (see `quorum_attachments::sanitize`).
    pub name: String,
    /// Slash-normalized, relative to the attachment store root.
    pub path: String,
    pub size: u64,
    pub content_type: String,
    pub created_at_epoch_ms: u64,
}
