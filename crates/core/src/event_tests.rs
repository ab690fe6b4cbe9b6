use super::*;

fn sample_event(kind: EventKind) -> Event {
    Event::new(
        1_700_000_000_000,
        WorkflowId::from_string("wfl-test"),
        Some(ProjectId::from_string("prj-test")),
        kind,
    )
}

#[test]
fn serializes_with_tag_and_envelope_fields() {
    let ev = sample_event(EventKind::KanbanExecutionStarted);
    let json = serde_json::to_value(&ev).expect("serialize");
    assert_eq!(json["type"], "kanban_execution_started");
    assert_eq!(json["workflow_id"], "wfl-test");
    assert_eq!(json["project_id"], "prj-test");
    assert_eq!(json["timestamp_epoch_ms"], 1_700_000_000_000u64);
}

#[test]
fn none_project_filter_matches_any_event() {
    let ev = sample_event(EventKind::WorkflowStarted);
    assert!(ev.matches_project(None));
    assert!(ev.matches_project(Some(ProjectId::from_string("prj-test"))));
    assert!(!ev.matches_project(Some(ProjectId::from_string("prj-other"))));
}

#[test]
fn global_event_with_no_project_only_matches_none_filter() {
    let ev = Event::new(1, WorkflowId::from_string("wfl-x"), None, EventKind::WorkflowStarted);
    assert!(ev.matches_project(None));
    assert!(!ev.matches_project(Some(ProjectId::from_string("prj-test"))));
}

#[test]
fn round_trips_through_json() {
    let ev = sample_event(EventKind::WorkflowFailed { error: "boom".into() });
    let json = serde_json::to_string(&ev).expect("serialize");
    let back: Event = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ev, back);
}

#[test]
fn unknown_type_tag_deserializes_to_custom() {
    let json = r#"{"type":"something_new_and_unknown","timestamp_epoch_ms":1,"workflow_id":"wfl-x","project_id":"prj-x"}"#;
    let ev: Event = serde_json::from_str(json).expect("deserialize");
    assert_eq!(ev.kind, EventKind::Custom);
    assert_eq!(ev.type_tag(), "custom");
}

#[test]
fn type_tag_matches_serialized_tag_for_every_variant() {
    let kinds = vec![
        EventKind::WorkflowStarted,
        EventKind::WorkflowCompleted { pr_url: None, pr_number: None },
        EventKind::KanbanWorkflowMoved { from: KanbanColumn::Todo, to: KanbanColumn::InProgress },
        EventKind::ControlAbort,
    ];
    for kind in kinds {
        let ev = sample_event(kind.clone());
        let json = serde_json::to_value(&ev).expect("serialize");
        assert_eq!(json["type"], kind.type_tag());
    }
}

#[test]
fn is_workflow_completed_and_failed_predicates() {
    assert!(EventKind::WorkflowCompleted { pr_url: None, pr_number: None }.is_workflow_completed());
    assert!(EventKind::WorkflowFailed { error: "x".into() }.is_workflow_failed());
    assert!(!EventKind::WorkflowStarted.is_workflow_completed());
}
