// SPDX-License-Identifier: MIT

//! The in-memory session cache fronting [`ChatStore`]: lazy per-project bulk
//! load, project isolation, and the `SendMessage` prompt pipeline.

use crate::error::ChatRegistryError;
use crate::file_context;
use crate::prompt::{self, DEFAULT_SYSTEM_PROMPT};
use parking_lot::{Mutex, RwLock};
use quorum_adapters::{AgentRegistry, AgentRequest};
use quorum_attachments::AttachmentStore;
use quorum_bus::EventBus;
use quorum_core::{ChatMessage, ChatRole, ChatSession, Clock, Event, EventKind, MessageId, OwnerType, SessionId, SystemClock, WorkflowId};
use quorum_storage::ChatStore;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ChatRegistryConfig {
    /// Most-recent-messages window folded into each prompt.
    pub history_window: usize,
    pub system_prompt: String,
}

impl Default for ChatRegistryConfig {
    fn default() -> Self {
        Self { history_window: 10, system_prompt: DEFAULT_SYSTEM_PROMPT.to_string() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SendMessageRequest {
    pub content: String,
    pub agent: Option<String>,
    pub model: Option<String>,
    pub reasoning_effort: Option<String>,
    pub attachments: Vec<String>,
}

pub struct ChatRegistry<C: Clock = SystemClock> {
    store: Arc<ChatStore>,
    agents: Option<Arc<dyn AgentRegistry>>,
    attachments: Option<Arc<AttachmentStore>>,
    bus: Option<Arc<EventBus>>,
    sessions: RwLock<HashMap<SessionId, ChatSession>>,
    loaded_roots: Mutex<HashSet<String>>,
    clock: C,
    config: ChatRegistryConfig,
}

impl ChatRegistry<SystemClock> {
    pub fn new(store: Arc<ChatStore>, config: ChatRegistryConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<C: Clock> ChatRegistry<C> {
    pub fn with_clock(store: Arc<ChatStore>, config: ChatRegistryConfig, clock: C) -> Self {
        Self { store, agents: None, attachments: None, bus: None, sessions: RwLock::new(HashMap::new()), loaded_roots: Mutex::new(HashSet::new()), clock, config }
    }

    pub fn with_agents(mut self, agents: Arc<dyn AgentRegistry>) -> Self {
        self.agents = Some(agents);
        self
    }

    pub fn with_attachments(mut self, attachments: Arc<AttachmentStore>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub fn with_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    fn validate_agent_name(&self, name: &str) -> Result<(), ChatRegistryError> {
        match &self.agents {
            Some(registry) if !registry.list().iter().any(|a| a == name) => Err(ChatRegistryError::UnknownAgent(name.to_string())),
            _ => Ok(()),
        }
    }

    pub fn create_session(&self, project_root: &str, agent: Option<String>, model: Option<String>) -> Result<ChatSession, ChatRegistryError> {
        let agent_name = agent.unwrap_or_else(|| ChatSession::DEFAULT_AGENT.to_string());
        self.validate_agent_name(&agent_name)?;

        let now = self.clock.epoch_ms();
        let session = ChatSession {
            id: SessionId::new(),
            title: "New chat".to_string(),
            created_at_epoch_ms: now,
            updated_at_epoch_ms: now,
            agent: agent_name,
            model: model.unwrap_or_default(),
            project_root: project_root.to_string(),
            message_count: 0,
            messages: Vec::new(),
        };
        self.store.save_session(&session)?;
        self.sessions.write().insert(session.id, session.clone());
        Ok(session)
    }

    /// Bulk-loads persisted sessions for `project_root` into the cache, once
    /// per (process, project_root). Adopts empty-root sessions into the
    /// caller's project; on collision with an already-cached session, keeps
    /// whichever has the larger message count, tie-broken by later `updated_at`.
    fn ensure_loaded(&self, project_root: &str) -> Result<(), ChatRegistryError> {
        if self.loaded_roots.lock().contains(project_root) {
            return Ok(());
        }
        let persisted = self.store.list_sessions()?;
        {
            let mut sessions = self.sessions.write();
            for mut session in persisted {
                if session.project_root.is_empty() {
                    session.project_root = project_root.to_string();
                }
                if !session.visible_to(project_root) {
                    continue;
                }
                let replace = match sessions.get(&session.id) {
                    Some(existing) => (session.message_count, session.updated_at_epoch_ms) > (existing.message_count, existing.updated_at_epoch_ms),
                    None => true,
                };
                if replace {
                    sessions.insert(session.id, session);
                }
            }
        }
        self.loaded_roots.lock().insert(project_root.to_string());
        Ok(())
    }

    pub fn list_sessions(&self, project_root: &str) -> Result<Vec<ChatSession>, ChatRegistryError> {
        self.ensure_loaded(project_root)?;
        Ok(self.sessions.read().values().filter(|s| s.visible_to(project_root)).cloned().collect())
    }

    fn get_or_load(&self, id: SessionId) -> Result<ChatSession, ChatRegistryError> {
        if let Some(session) = self.sessions.read().get(&id).cloned() {
            return Ok(session);
        }
        let session = self.store.load_session(&id)?;
        self.sessions.write().insert(id, session.clone());
        Ok(session)
    }

    pub fn get_session(&self, id: SessionId) -> Result<ChatSession, ChatRegistryError> {
        self.get_or_load(id)
    }

    pub fn get_messages(&self, id: SessionId) -> Result<Vec<ChatMessage>, ChatRegistryError> {
        self.get_or_load(id)?;
        Ok(self.store.load_messages(&id)?)
    }

    fn persist_and_cache(&self, mut session: ChatSession) -> Result<ChatSession, ChatRegistryError> {
        session.updated_at_epoch_ms = self.clock.epoch_ms();
        self.store.save_session(&session)?;
        self.sessions.write().insert(session.id, session.clone());
        Ok(session)
    }

    pub fn update_session(&self, id: SessionId, title: Option<String>) -> Result<ChatSession, ChatRegistryError> {
        let mut session = self.get_or_load(id)?;
        if let Some(title) = title {
            session.title = title;
        }
        self.persist_and_cache(session)
    }

    pub fn set_agent(&self, id: SessionId, agent: String) -> Result<ChatSession, ChatRegistryError> {
        self.validate_agent_name(&agent)?;
        let mut session = self.get_or_load(id)?;
        session.agent = agent;
        self.persist_and_cache(session)
    }

    pub fn set_model(&self, id: SessionId, model: String) -> Result<ChatSession, ChatRegistryError> {
        let mut session = self.get_or_load(id)?;
        session.model = model;
        self.persist_and_cache(session)
    }

    /// Cascades to the session's attachments, best-effort: a cascade failure
    /// is logged, not surfaced, since the session row is already gone.
    pub fn delete_session(&self, id: SessionId) -> Result<(), ChatRegistryError> {
        self.store.delete_session(&id)?;
        self.sessions.write().remove(&id);
        if let Some(attachments) = &self.attachments {
            if let Err(err) = attachments.delete_all(OwnerType::Chat, id.as_str()) {
                warn!(session_id = %id, error = %err, "failed to cascade-delete chat attachments");
            }
        }
        Ok(())
    }

    fn publish_received(&self, session_id: SessionId, message_id: MessageId) {
        let Some(bus) = &self.bus else { return };
        bus.publish(Event::new(self.clock.epoch_ms(), WorkflowId::from_string(""), None, EventKind::ChatMessageReceived { session_id, message_id }));
    }

    fn resolve_attachments(&self, project_root: &Path, references: &[String]) -> Vec<(String, String)> {
        let mut files = Vec::with_capacity(references.len());
        for reference in references {
            match file_context::read_file_in_project(project_root, reference) {
                Ok(content) => files.push((reference.clone(), content)),
                Err(err) => warn!(%reference, error = %err, "skipping unreadable attached file reference"),
            }
        }
        files
    }

    async fn append_reply(&self, id: SessionId, role: ChatRole, agent: Option<String>, content: String, tokens_in: u32, tokens_out: u32, cost_usd: f64) -> Result<ChatMessage, ChatRegistryError> {
        let message = ChatMessage { id: MessageId::new(), session_id: id, role, agent, content, timestamp_epoch_ms: self.clock.epoch_ms(), tokens_in, tokens_out, cost_usd };
        self.store.save_message(&message)?;
        if let Some(session) = self.sessions.write().get_mut(&id) {
            session.updated_at_epoch_ms = message.timestamp_epoch_ms;
            session.message_count += 1;
        }
        self.publish_received(id, message.id);
        Ok(message)
    }

    /// Appends the user message, builds a bounded prompt (history plus any
    /// resolved `@file` / explicit attachments), invokes the session's
    /// agent, and appends the reply — or, on agent failure, a `system`
    /// message carrying the error.
    pub async fn send_message(&self, id: SessionId, project_root: &Path, request: SendMessageRequest) -> Result<ChatMessage, ChatRegistryError> {
        let mut session = self.get_or_load(id)?;
        if let Some(agent) = &request.agent {
            self.validate_agent_name(agent)?;
            session.agent = agent.clone();
        }
        if let Some(model) = &request.model {
            session.model = model.clone();
        }
        session = self.persist_and_cache(session)?;

        self.append_reply(id, ChatRole::User, None, request.content.clone(), 0, 0, 0.0).await?;

        let history = self.store.load_messages(&id)?;
        let inline_refs = prompt::extract_file_references(&request.content);
        let references = prompt::union_attachments(&request.attachments, &inline_refs);
        let files = self.resolve_attachments(project_root, &references);
        let prompt_text = prompt::build_prompt(&history, self.config.history_window, &files);

        let agent = match &self.agents {
            Some(registry) => registry.get(&session.agent)?,
            None => return Err(ChatRegistryError::UnknownAgent(session.agent.clone())),
        };
        let agent_request = AgentRequest { prompt: prompt_text, system_prompt: self.config.system_prompt.clone(), model: session.model.clone(), phase: None, reasoning_effort: request.reasoning_effort };

        match agent.execute(agent_request).await {
            Ok(response) => self.append_reply(id, ChatRole::Agent, Some(session.agent.clone()), response.output, response.tokens_in, response.tokens_out, response.cost_usd).await,
            Err(err) => {
                self.append_reply(id, ChatRole::System, None, format!("agent error: {err}"), 0, 0, 0.0).await?;
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
