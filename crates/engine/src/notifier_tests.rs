use super::*;
use quorum_core::test_support::workflow_completed_event;
use quorum_core::{FakeClock, WorkflowId};

struct RecordingSaver {
    calls: Mutex<Vec<(WorkflowId, usize)>>,
    fail_next: AtomicBool,
}

impl RecordingSaver {
    fn new() -> Self {
        Self { calls: Mutex::new(Vec::new()), fail_next: AtomicBool::new(false) }
    }
}

impl StateSaver for RecordingSaver {
    fn save(&self, workflow_id: WorkflowId, events: Vec<AgentEvent>) -> Result<(), NotifierError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NotifierError::Save("boom".into()));
        }
        self.calls.lock().push((workflow_id, events.len()));
        Ok(())
    }
}

fn agent_event(n: usize) -> AgentEvent {
    AgentEvent { id: format!("{n}-claude"), event_type: "message".into(), agent: "claude".into(), message: format!("event {n}"), data: Default::default(), timestamp_epoch_ms: n as u64, execution_id: "exec-1".into() }
}

fn chunk_event() -> AgentEvent {
    AgentEvent { id: "1-claude".into(), event_type: "chunk".into(), agent: "claude".into(), message: "tok".into(), data: Default::default(), timestamp_epoch_ms: 1, execution_id: "exec-1".into() }
}

#[tokio::test]
async fn publishes_workflow_lifecycle_events() {
    let bus = Arc::new(EventBus::default());
    let (_, mut rx) = bus.subscribe(None, None);
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver> = ProgressNotifier::new(bus.clone(), None, workflow_id);

    notifier.workflow_started();
    notifier.workflow_completed(Some("https://example.com/pr/1".into()), Some(1)).await;

    let started = rx.recv().await.unwrap();
    assert_eq!(started.type_tag(), "workflow_started");
    let completed = rx.recv().await.unwrap();
    assert_eq!(completed.type_tag(), "workflow_completed");
}

#[tokio::test]
async fn chunk_events_publish_but_never_join_the_trace() {
    let bus = Arc::new(EventBus::default());
    let (_, mut rx) = bus.subscribe(None, None);
    let saver = Arc::new(RecordingSaver::new());
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver> = ProgressNotifier::new(bus, None, workflow_id).with_trace(saver.clone());

    notifier.agent_event(chunk_event());
    let received = rx.recv().await.unwrap();
    assert_eq!(received.type_tag(), "agent_event");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(saver.calls.lock().is_empty(), "chunk events must not be persisted");
}

#[tokio::test]
async fn first_non_chunk_event_saves_immediately() {
    let bus = Arc::new(EventBus::default());
    let saver = Arc::new(RecordingSaver::new());
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver> = ProgressNotifier::new(bus, None, workflow_id).with_trace(saver.clone());

    notifier.agent_event(agent_event(1));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let calls = saver.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (workflow_id, 1));
}

#[tokio::test]
async fn trace_is_capped_at_max_agent_events() {
    let bus = Arc::new(EventBus::default());
    let saver = Arc::new(RecordingSaver::new());
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver> = ProgressNotifier::new(bus, None, workflow_id).with_trace(saver);

    for n in 0..MAX_AGENT_EVENTS + 10 {
        notifier.agent_event(agent_event(n));
    }

    let trace = notifier.trace.as_ref().unwrap();
    assert_eq!(trace.events.lock().len(), MAX_AGENT_EVENTS);
    assert_eq!(trace.events.lock().first().unwrap().id, agent_event(10).id);
}

#[tokio::test]
async fn flush_state_saves_synchronously_and_clears_dirty() {
    let bus = Arc::new(EventBus::default());
    let saver = Arc::new(RecordingSaver::new());
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver> = ProgressNotifier::new(bus, None, workflow_id).with_trace(saver.clone());

    notifier.agent_event(agent_event(1));
    notifier.flush_state().await;

    let trace = notifier.trace.as_ref().unwrap();
    assert!(!trace.dirty.load(Ordering::SeqCst));
    assert!(!saver.calls.lock().is_empty());
}

#[tokio::test]
async fn uses_the_injected_clock_for_event_timestamps() {
    let bus = Arc::new(EventBus::default());
    let (_, mut rx) = bus.subscribe(None, None);
    let clock = FakeClock::new();
    clock.set_epoch_ms(123_456);
    let workflow_id = WorkflowId::new();
    let notifier: ProgressNotifier<RecordingSaver, FakeClock> = ProgressNotifier::with_clock(bus, None, workflow_id, clock);

    notifier.log("info", "hello");
    let event = rx.recv().await.unwrap();
    assert_eq!(event.timestamp_epoch_ms, 123_456);
}

#[test]
fn workflow_completed_event_helper_has_expected_shape() {
    let event = workflow_completed_event(WorkflowId::new(), quorum_core::ProjectId::new());
    assert!(event.kind.is_workflow_completed());
}
