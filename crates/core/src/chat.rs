// SPDX-License-Identifier: MIT

//! Chat session and message types shared by the chat store and registry.

use crate::ids::{MessageId, SessionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Agent,
    System,
}

crate::simple_display! {
    ChatRole {
        User => "user",
        Agent => "agent",
        System => "system",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub session_id: SessionId,
    pub role: ChatRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub content: String,
    pub timestamp_epoch_ms: u64,
    #[serde(default)]
    pub tokens_in: u32,
    #[serde(default)]
    pub tokens_out: u32,
    #[serde(default)]
    pub cost_usd: f64,
}

crate::builder! {
    pub struct ChatMessageBuilder => ChatMessage {
        set { session_id: SessionId = SessionId::new() }
        set { role: ChatRole = ChatRole::User }
        option { agent: String = None }
        into { content: String = "" }
        set { timestamp_epoch_ms: u64 = 0 }
        set { tokens_in: u32 = 0 }
        set { tokens_out: u32 = 0 }
        set { cost_usd: f64 = 0.0 }
        computed { id: MessageId = MessageId::new() }
    }
}

/// An interactive conversation with an agent, scoped to (at most) one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: String,
    pub created_at_epoch_ms: u64,
    pub updated_at_epoch_ms: u64,
    pub agent: String,
    pub model: String,
    /// Empty string means "adopt into whichever project loads this session
    /// next": an empty `project_root` belongs to the caller's current
    /// project, not to no project.
    #[serde(default)]
    pub project_root: String,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ChatMessage>,
}

crate::builder! {
    pub struct ChatSessionBuilder => ChatSession {
        into { title: String = "New chat" }
        set { created_at_epoch_ms: u64 = 0 }
        set { updated_at_epoch_ms: u64 = 0 }
        into { agent: String = "claude" }
        into { model: String = "" }
        into { project_root: String = "" }
        set { message_count: u32 = 0 }
        computed { id: SessionId = SessionId::new() }
        computed { messages: Vec<ChatMessage> = Vec::new() }
    }
}

impl ChatSession {
    pub const DEFAULT_AGENT: &'static str = "claude";

    /// Whether this session, as persisted, belongs to `caller_project_root`
    /// (invariant 5: empty stored root belongs to the current caller).
    pub fn visible_to(&self, caller_project_root: &str) -> bool {
        self.project_root.is_empty() || self.project_root == caller_project_root
    }
}
