use super::*;

#[test]
fn engine_may_transition_todo_to_in_progress() {
    assert!(KanbanColumn::Todo.engine_may_transition_to(KanbanColumn::InProgress));
}

#[test]
fn engine_may_not_transition_refinement_to_todo() {
    assert!(!KanbanColumn::Refinement.engine_may_transition_to(KanbanColumn::Todo));
}

#[test]
fn engine_may_not_skip_todo_to_to_verify() {
    assert!(!KanbanColumn::Todo.engine_may_transition_to(KanbanColumn::ToVerify));
}

#[test]
fn move_to_refinement_then_todo_clears_last_error() {
    let mut w = WorkflowState::builder().build();
    w.kanban_last_error = Some("boom".into());
    w.move_to(KanbanColumn::Refinement, 0);
    assert_eq!(w.kanban_last_error.as_deref(), Some("boom"));

    w.move_to(KanbanColumn::Todo, 0);
    assert_eq!(w.kanban_last_error, None);
}

#[test]
fn column_display_matches_wire_names() {
    assert_eq!(KanbanColumn::InProgress.to_string(), "in_progress");
    assert_eq!(KanbanColumn::ToVerify.to_string(), "to_verify");
}
