use super::*;
use async_trait::async_trait;
use quorum_adapters::fakes::{FakeAgent, FakeAgentRegistry};
use quorum_adapters::{Agent, AgentError, AgentRequest, AgentResponse};
use quorum_storage::ChatStoreConfig;

fn temp_store() -> (Arc<ChatStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = ChatStore::open(ChatStoreConfig { path: dir.path().join("chat.sqlite3") }).unwrap();
    (Arc::new(store), dir)
}

fn registry_with_agent(store: Arc<ChatStore>, output: &str) -> (ChatRegistry, Arc<FakeAgent>) {
    let agent = Arc::new(FakeAgent::new(output));
    let agents: Arc<dyn AgentRegistry> = Arc::new(FakeAgentRegistry::new().with_agent("claude", agent.clone()));
    (ChatRegistry::new(store, ChatRegistryConfig::default()).with_agents(agents), agent)
}

struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    async fn execute(&self, _request: AgentRequest) -> Result<AgentResponse, AgentError> {
        Err(AgentError::Execution("model unavailable".to_string()))
    }
}

fn bare_session(id: SessionId, project_root: &str, message_count: u32, updated_at_epoch_ms: u64) -> ChatSession {
    ChatSession {
        id,
        title: "t".to_string(),
        created_at_epoch_ms: 1,
        updated_at_epoch_ms,
        agent: "claude".to_string(),
        model: String::new(),
        project_root: project_root.to_string(),
        message_count,
        messages: Vec::new(),
    }
}

#[test]
fn create_session_rejects_an_unregistered_agent() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store, "hi");
    let err = registry.create_session("/repo", Some("gpt".to_string()), None).unwrap_err();
    assert!(matches!(err, ChatRegistryError::UnknownAgent(_)));
}

#[test]
fn create_session_defaults_agent_and_persists_to_the_store() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let session = registry.create_session("/repo", None, None).unwrap();
    assert_eq!(session.agent, ChatSession::DEFAULT_AGENT);
    assert_eq!(store.load_session(&session.id).unwrap().id, session.id);
}

#[test]
fn list_sessions_is_isolated_by_project_root() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store, "hi");
    let a = registry.create_session("/repo/a", None, None).unwrap();
    registry.create_session("/repo/b", None, None).unwrap();

    let visible = registry.list_sessions("/repo/a").unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, a.id);
}

#[test]
fn list_sessions_adopts_empty_root_sessions_into_the_caller_project() {
    let (store, _dir) = temp_store();
    let orphan = bare_session(SessionId::new(), "", 0, 1);
    store.save_session(&orphan).unwrap();

    let (registry, _agent) = registry_with_agent(store, "hi");
    let visible = registry.list_sessions("/repo/a").unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].project_root, "/repo/a");
}

#[test]
fn list_sessions_bulk_loads_a_project_root_only_once() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    registry.list_sessions("/repo/a").unwrap();

    let late = bare_session(SessionId::new(), "/repo/a", 0, 1);
    store.save_session(&late).unwrap();

    let visible = registry.list_sessions("/repo/a").unwrap();
    assert!(!visible.iter().any(|s| s.id == late.id));
}

#[test]
fn bulk_load_merge_keeps_the_cached_session_with_more_messages() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let id = SessionId::new();

    let stale = bare_session(id, "/repo", 1, 1);
    store.save_session(&stale).unwrap();
    let richer = bare_session(id, "/repo", 5, 2);
    registry.sessions.write().insert(id, richer);

    let visible = registry.list_sessions("/repo").unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].message_count, 5);
}

#[test]
fn bulk_load_merge_prefers_the_persisted_session_when_it_has_more_messages() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let id = SessionId::new();

    let richer_persisted = bare_session(id, "/repo", 5, 2);
    store.save_session(&richer_persisted).unwrap();
    let stale_cached = bare_session(id, "/repo", 1, 1);
    registry.sessions.write().insert(id, stale_cached);

    let visible = registry.list_sessions("/repo").unwrap();
    assert_eq!(visible[0].message_count, 5);
}

#[test]
fn get_session_lazily_loads_a_session_missing_from_the_cache() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let session = registry.create_session("/repo", None, None).unwrap();

    let other = ChatRegistry::new(store, ChatRegistryConfig::default());
    let loaded = other.get_session(session.id).unwrap();
    assert_eq!(loaded.id, session.id);
}

#[test]
fn update_session_persists_the_new_title() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let session = registry.create_session("/repo", None, None).unwrap();

    let updated = registry.update_session(session.id, Some("renamed".to_string())).unwrap();
    assert_eq!(updated.title, "renamed");
    assert_eq!(store.load_session(&session.id).unwrap().title, "renamed");
}

#[test]
fn set_agent_rejects_an_unregistered_agent_and_leaves_the_session_unchanged() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store, "hi");
    let session = registry.create_session("/repo", None, None).unwrap();

    let err = registry.set_agent(session.id, "gpt".to_string()).unwrap_err();
    assert!(matches!(err, ChatRegistryError::UnknownAgent(_)));
    assert_eq!(registry.get_session(session.id).unwrap().agent, ChatSession::DEFAULT_AGENT);
}

#[test]
fn set_model_persists_the_new_model() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let session = registry.create_session("/repo", None, None).unwrap();

    registry.set_model(session.id, "opus".to_string()).unwrap();
    assert_eq!(store.load_session(&session.id).unwrap().model, "opus");
}

#[test]
fn delete_session_removes_it_from_the_store_and_the_cache() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store.clone(), "hi");
    let session = registry.create_session("/repo", None, None).unwrap();

    registry.delete_session(session.id).unwrap();
    assert!(store.load_session(&session.id).is_err());
    assert!(registry.list_sessions("/repo").unwrap().is_empty());
}

#[tokio::test]
async fn send_message_appends_the_user_message_and_the_agent_reply() {
    let (store, _dir) = temp_store();
    let (registry, agent) = registry_with_agent(store, "pong");
    let session = registry.create_session("/repo", None, None).unwrap();
    let project_root = tempfile::tempdir().unwrap();

    let reply = registry
        .send_message(session.id, project_root.path(), SendMessageRequest { content: "ping".to_string(), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(reply.role, ChatRole::Agent);
    assert_eq!(reply.content, "pong");

    let messages = registry.get_messages(session.id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[0].content, "ping");
    assert_eq!(agent.calls.lock().len(), 1);
}

#[tokio::test]
async fn send_message_folds_inline_file_references_into_the_prompt() {
    let (store, _dir) = temp_store();
    let (registry, agent) = registry_with_agent(store, "ack");
    let session = registry.create_session("/repo", None, None).unwrap();

    let project_root = tempfile::tempdir().unwrap();
    std::fs::write(project_root.path().join("notes.md"), b"remember this").unwrap();

    registry
        .send_message(session.id, project_root.path(), SendMessageRequest { content: "see @notes.md".to_string(), ..Default::default() })
        .await
        .unwrap();

    let calls = agent.calls.lock();
    let prompt = &calls[0].prompt;
    assert!(prompt.contains("### notes.md"));
    assert!(prompt.contains("remember this"));
}

#[tokio::test]
async fn send_message_skips_an_unreadable_file_reference_without_failing() {
    let (store, _dir) = temp_store();
    let (registry, agent) = registry_with_agent(store, "ack");
    let session = registry.create_session("/repo", None, None).unwrap();
    let project_root = tempfile::tempdir().unwrap();

    let reply = registry
        .send_message(session.id, project_root.path(), SendMessageRequest { content: "see @missing.md".to_string(), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(reply.content, "ack");
    assert!(!agent.calls.lock()[0].prompt.contains("## Attached Files"));
}

#[tokio::test]
async fn send_message_records_an_agent_failure_as_a_system_message() {
    let (store, _dir) = temp_store();
    let agents: Arc<dyn AgentRegistry> = Arc::new(FakeAgentRegistry::new().with_agent("claude", Arc::new(FailingAgent)));
    let registry = ChatRegistry::new(store.clone(), ChatRegistryConfig::default()).with_agents(agents);
    let session = registry.create_session("/repo", None, None).unwrap();
    let project_root = tempfile::tempdir().unwrap();

    let err = registry
        .send_message(session.id, project_root.path(), SendMessageRequest { content: "ping".to_string(), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ChatRegistryError::Agent(_)));

    let messages = registry.get_messages(session.id).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, ChatRole::System);
    assert!(messages[1].content.contains("model unavailable"));
}

#[tokio::test]
async fn send_message_uses_the_fake_agents_canned_duration_and_cost() {
    let (store, _dir) = temp_store();
    let (registry, _agent) = registry_with_agent(store, "hi");
    let session = registry.create_session("/repo", None, None).unwrap();
    let project_root = tempfile::tempdir().unwrap();

    let reply = registry
        .send_message(session.id, project_root.path(), SendMessageRequest { content: "ping".to_string(), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(reply.tokens_in, 10);
    assert_eq!(reply.tokens_out, 20);
    assert!((reply.cost_usd - 0.01).abs() < f64::EPSILON);
}
