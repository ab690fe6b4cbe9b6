use super::*;
use quorum_adapters::fakes::{FakeExecutor, FakeProjectStateProvider, InMemoryKanbanStateManager};
use quorum_adapters::Project;
use quorum_core::test_support::todo_workflow;
use quorum_core::ProjectId;

fn make_engine(workflows: Vec<quorum_core::WorkflowState>, threshold: u32) -> (Arc<KanbanEngine<FakeExecutor, FakeProjectStateProvider>>, Arc<FakeExecutor>, Arc<InMemoryKanbanStateManager>, ProjectId) {
    let bus = Arc::new(EventBus::default());
    let executor = Arc::new(FakeExecutor::new(bus.clone()));
    let manager = Arc::new(InMemoryKanbanStateManager::new(workflows));
    let project_id = ProjectId::new();
    let project = Project { id: project_id, name: "p1".into() };
    let providers = Arc::new(FakeProjectStateProvider::new(project, manager.clone(), bus.clone()));
    let engine = Arc::new(KanbanEngine::new(executor.clone(), providers, bus, EngineConfig { tick_interval: Duration::from_millis(10), circuit_breaker_threshold: threshold }));
    (engine, executor, manager, project_id)
}

/// Early (synchronous) failures resolve inside a detached tokio task with no
/// bus event to await; poll instead of guessing a sleep duration.
async fn wait_until_idle<E, P>(engine: &Arc<KanbanEngine<E, P>>)
where
    E: quorum_adapters::WorkflowExecutor + 'static,
    P: quorum_adapters::ProjectStateProvider + 'static,
{
    for _ in 0..200 {
        if engine.is_idle() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("engine never returned to idle");
}

#[tokio::test]
async fn s1_scheduler_picks_one_workflow_per_tick() {
    let w1 = todo_workflow("first", 0);
    let w1_id = w1.id;
    let (engine, _executor, manager, _project) = make_engine(vec![w1], 2);
    engine.enable().unwrap();

    let (_, mut rx) = engine.bus.subscribe(None, None);
    engine.tick().await;

    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_workflow_moved");
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_execution_started");
    assert_eq!(manager.load_by_id(w1_id).unwrap().kanban_column, KanbanColumn::InProgress);
    assert_eq!((*engine.current.lock()).unwrap().workflow_id, w1_id);

    // A second tick while already executing must not start anything else.
    engine.tick().await;
    assert_eq!((*engine.current.lock()).unwrap().workflow_id, w1_id);
}

#[tokio::test]
async fn s2_successful_completion_clears_execution_and_resets_breaker() {
    let w1 = todo_workflow("first", 0);
    let w1_id = w1.id;
    let (engine, _executor, manager, _project) = make_engine(vec![w1], 2);
    engine.enable().unwrap();

    let (_, mut rx) = engine.bus.subscribe(None, None);
    engine.tick().await;
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_workflow_moved");
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_execution_started");

    // FakeExecutor publishes this once the spawned task's `run` resolves.
    let terminal = rx.recv().await.unwrap();
    assert_eq!(terminal.type_tag(), "workflow_completed");
    engine.handle_event(terminal).await;

    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_workflow_moved");
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_execution_completed");

    assert!(engine.is_idle());
    assert_eq!(manager.load_by_id(w1_id).unwrap().kanban_column, KanbanColumn::ToVerify);
    assert_eq!(engine.circuit_breaker().consecutive_failures(), 0);
}

#[tokio::test]
async fn completion_reads_pr_info_from_the_stored_workflow_not_the_event() {
    let w1 = todo_workflow("first", 0);
    let w1_id = w1.id;
    let (engine, _executor, manager, _project) = make_engine(vec![w1], 2);
    engine.enable().unwrap();

    let (_, mut rx) = engine.bus.subscribe(None, None);
    engine.tick().await;
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_workflow_moved");
    assert_eq!(rx.recv().await.unwrap().type_tag(), "kanban_execution_started");

    // Simulate the PR having been opened mid-execution and recorded on the
    // stored workflow, while the terminal event itself (as FakeExecutor
    // always publishes it) carries no PR info at all.
    manager.update_kanban_status(w1_id, KanbanColumn::InProgress, Some("https://example.com/pr/7".to_string()), Some(7), String::new()).unwrap();

    let terminal = rx.recv().await.unwrap();
    assert_eq!(terminal.type_tag(), "workflow_completed");
    engine.handle_event(terminal).await;

    let completed = manager.load_by_id(w1_id).unwrap();
    assert_eq!(completed.kanban_column, KanbanColumn::ToVerify);
    assert_eq!(completed.pr_url.as_deref(), Some("https://example.com/pr/7"));
    assert_eq!(completed.pr_number, Some(7));
}

#[tokio::test]
async fn s3_circuit_trips_after_threshold_failures() {
    let w2 = todo_workflow("second", 0);
    let w3 = todo_workflow("third", 1);
    let (engine, executor, manager, _project) = make_engine(vec![w2.clone(), w3.clone()], 2);
    executor.fail_early(w2.id, "boom");
    executor.fail_early(w3.id, "boom");
    engine.enable().unwrap();

    engine.tick().await;
    wait_until_idle(&engine).await;
    assert_eq!(manager.load_by_id(w2.id).unwrap().kanban_column, KanbanColumn::Refinement);
    assert!(!engine.circuit_breaker().is_open());

    engine.tick().await;
    wait_until_idle(&engine).await;
    assert_eq!(manager.load_by_id(w3.id).unwrap().kanban_column, KanbanColumn::Refinement);

    assert!(engine.circuit_breaker().is_open());
    assert!(!engine.is_enabled());
    assert_eq!(engine.circuit_breaker().consecutive_failures(), 2);

    let err = engine.enable().unwrap_err();
    assert!(err.to_string().contains("circuit breaker is open"));

    engine.reset_circuit_breaker();
    assert!(engine.enable().is_ok());
}

#[tokio::test]
async fn s4_interruption_recovery_moves_running_workflow_to_refinement() {
    let mut w4 = todo_workflow("fourth", 0);
    w4.status = quorum_core::WorkflowStatus::Running;
    let w4_id = w4.id;
    let (engine, _executor, manager, _project) = make_engine(vec![w4], 2);
    manager.save_kanban_engine_state(&quorum_core::EngineState { enabled: true, current_workflow_id: Some(w4_id), consecutive_failures: 0, circuit_breaker_open: false, last_failure_at_epoch_ms: None }).unwrap();

    engine.recover().await;

    let recovered = manager.load_by_id(w4_id).unwrap();
    assert_eq!(recovered.kanban_column, KanbanColumn::Refinement);
    assert_eq!(recovered.kanban_last_error.as_deref(), Some("workflow interrupted during execution (server restart)"));
    assert!(engine.is_idle());
}

#[tokio::test]
async fn early_failure_below_threshold_does_not_open_the_breaker() {
    let w1 = todo_workflow("first", 0);
    let (engine, executor, manager, _project) = make_engine(vec![w1.clone()], 3);
    executor.fail_early(w1.id, "validation failed");
    engine.enable().unwrap();

    engine.tick().await;
    wait_until_idle(&engine).await;

    assert_eq!(manager.load_by_id(w1.id).unwrap().kanban_column, KanbanColumn::Refinement);
    assert!(!engine.circuit_breaker().is_open());
    assert!(engine.is_enabled());
}
