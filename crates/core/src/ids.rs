// SPDX-License-Identifier: MIT

//! Typed identifiers for every addressable entity in the runtime core.

use crate::define_id;

define_id! {
    /// Opaque identifier for a workflow, globally unique across the process.
    pub struct WorkflowId("wfl-");
}

define_id! {
    /// Identifier for a project — a unit of isolation carrying its own
    /// state manager, event bus, and execution context.
    pub struct ProjectId("prj-");
}

define_id! {
    /// Identifier for a chat session.
    pub struct SessionId("cht-");
}

define_id! {
    /// Identifier for a single chat message within a session.
    pub struct MessageId("msg-");
}

define_id! {
    /// Identifier for a stored attachment blob.
    pub struct AttachmentId("att-");
}

/// Process-local subscriber handle. Unlike the other IDs this never crosses
/// a process boundary or gets persisted, so it is a plain monotonic counter
/// rather than a random nanoid — uniqueness only needs to hold within one
/// running bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Mint a subscription id from a process-local counter. Public so the
    /// event bus (the only legitimate owner of such a counter) can allocate
    /// them; nothing else in the system should call this.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_id_has_expected_prefix() {
        let id = WorkflowId::new();
        assert!(id.as_str().starts_with("wfl-"));
    }

    #[test]
    fn distinct_id_types_do_not_collide_in_prefix() {
        assert_ne!(WorkflowId::PREFIX, SessionId::PREFIX);
        assert_ne!(SessionId::PREFIX, AttachmentId::PREFIX);
    }

    #[test]
    fn subscription_ids_display_with_prefix() {
        assert_eq!(SubscriptionId::from_raw(7).to_string(), "sub-7");
    }
}
