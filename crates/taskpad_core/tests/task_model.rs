use taskpad_core::{Task, TaskValidationError};

#[test]
fn new_task_sets_defaults() {
    let task = Task::new("Buy milk", None).unwrap();

    assert!(!task.id.is_empty());
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description, None);
    assert!(!task.completed);
    assert_eq!(task.created_at, task.updated_at);
    task.validate().unwrap();
}

#[test]
fn new_task_trims_title_and_description() {
    let task = Task::new("  Buy milk  ", Some("  2% if they have it  ")).unwrap();

    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.description.as_deref(), Some("2% if they have it"));
}

#[test]
fn whitespace_only_description_normalizes_to_none() {
    let task = Task::new("Buy milk", Some("   ")).unwrap();
    assert_eq!(task.description, None);
}

#[test]
fn empty_title_is_rejected() {
    let err = Task::new("", None).unwrap_err();
    assert_eq!(err, TaskValidationError::EmptyTitle);

    let err = Task::new("   ", None).unwrap_err();
    assert_eq!(err, TaskValidationError::EmptyTitle);
}

#[test]
fn generated_ids_are_distinct() {
    let a = Task::new("a", None).unwrap();
    let b = Task::new("b", None).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn validate_rejects_reversed_timestamps() {
    let mut task = Task::new("Buy milk", None).unwrap();
    task.updated_at = task.created_at - 1;

    let err = task.validate().unwrap_err();
    assert_eq!(
        err,
        TaskValidationError::TimestampOrder {
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    );
}

#[test]
fn validate_rejects_empty_id() {
    let mut task = Task::new("Buy milk", None).unwrap();
    task.id = String::new();

    assert_eq!(task.validate().unwrap_err(), TaskValidationError::EmptyId);
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let mut task = Task::new("Ship release", Some("tag and upload")).unwrap();
    task.id = "11111111-2222-4333-8444-555555555555".to_string();
    task.created_at = 1_700_000_000_000;
    task.updated_at = 1_700_000_360_000;

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["title"], "Ship release");
    assert_eq!(json["description"], "tag and upload");
    assert_eq!(json["completed"], false);
    assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
    assert_eq!(json["updatedAt"], 1_700_000_360_000_i64);

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, task);
}

#[test]
fn absent_description_is_omitted_on_the_wire() {
    let task = Task::new("Buy milk", None).unwrap();

    let json = serde_json::to_value(&task).unwrap();
    assert!(json.get("description").is_none());

    let decoded: Task = serde_json::from_value(json).unwrap();
    assert_eq!(decoded.description, None);
}
