//! Feedback recording tests
//!
//! Cover the observable ledger contract through the controller: submitted
//! scores come back exactly once and unmodified, invalid input is rejected
//! without side effects, and anonymized feedback accumulates per task.

mod test_helpers;

use agent_quality::error::QualityError;
use serde_json::json;
use test_helpers::in_memory_controller;

#[tokio::test]
async fn test_recorded_feedback_appears_exactly_once() {
    let controller = in_memory_controller();
    controller.record_feedback("agent1", "task1", 0.3).await.unwrap();
    let record = controller
        .record_feedback("agent1", "task1", 0.123456789)
        .await
        .unwrap();

    let history = controller
        .get_agent_feedback_history("agent1", Some("task1"))
        .await
        .unwrap();

    let matches: Vec<_> = history.iter().filter(|r| r.id == record.id).collect();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].score, 0.123456789);
    assert_eq!(history.last().unwrap().id, record.id);
}

#[tokio::test]
async fn test_out_of_range_score_is_validation_error() {
    let controller = in_memory_controller();

    let result = controller.record_feedback("a", "t", 1.5).await;

    assert!(matches!(result, Err(QualityError::Validation { .. })));
    let history = controller.get_agent_feedback_history("a", None).await.unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_empty_identifiers_are_validation_errors() {
    let controller = in_memory_controller();

    assert!(matches!(
        controller.record_feedback("", "t", 0.5).await,
        Err(QualityError::Validation { .. })
    ));
    assert!(matches!(
        controller.record_feedback("a", "", 0.5).await,
        Err(QualityError::Validation { .. })
    ));
}

#[tokio::test]
async fn test_history_without_filter_spans_task_types() {
    let controller = in_memory_controller();
    controller.record_feedback("agent1", "summarize", 0.4).await.unwrap();
    controller.record_feedback("agent1", "translate", 0.6).await.unwrap();
    controller.record_feedback("agent2", "summarize", 0.9).await.unwrap();

    let history = controller
        .get_agent_feedback_history("agent1", None)
        .await
        .unwrap();

    let task_types: Vec<&str> = history.iter().map(|r| r.task_type.as_str()).collect();
    assert_eq!(task_types, vec!["summarize", "translate"]);
    assert!(history.iter().all(|r| r.agent_id == "agent1"));
}

#[tokio::test]
async fn test_anonymized_feedback_round_trip() {
    let controller = in_memory_controller();

    controller
        .record_anonymized_feedback("task1", "Great job!", 5.0)
        .await
        .unwrap();

    let entries = controller.get_anonymized_feedback("task1").await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "Great job!");
    assert_eq!(entries[0].rating, 5.0);
}

#[tokio::test]
async fn test_anonymized_feedback_accumulates_in_order() {
    let controller = in_memory_controller();

    controller
        .record_anonymized_feedback("task1", "first", 3.0)
        .await
        .unwrap();
    controller
        .record_anonymized_feedback("task1", "second", 4.0)
        .await
        .unwrap();
    controller
        .record_anonymized_feedback("task2", "elsewhere", 1.0)
        .await
        .unwrap();

    let entries = controller.get_anonymized_feedback("task1").await.unwrap();
    let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
    assert_eq!(entries.last().unwrap().rating, 4.0);
}

#[tokio::test]
async fn test_anonymized_rating_outside_scale_rejected() {
    let controller = in_memory_controller();

    let result = controller
        .record_anonymized_feedback("task1", "too good", 6.0)
        .await;

    assert!(matches!(result, Err(QualityError::Validation { .. })));
    assert!(controller
        .get_anonymized_feedback("task1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_task_has_no_anonymized_feedback() {
    let controller = in_memory_controller();
    assert!(controller
        .get_anonymized_feedback("never")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_client_standards_last_write_wins() {
    let controller = in_memory_controller();
    let s1 = json!({"threshold": 0.8}).as_object().cloned().unwrap();
    let s2 = json!({"threshold": 0.95, "style": "concise"})
        .as_object()
        .cloned()
        .unwrap();

    controller.set_client_quality_standards("client1", s1);
    controller.set_client_quality_standards("client1", s2.clone());

    assert_eq!(controller.get_client_quality_standards("client1"), Some(s2));
}

#[tokio::test]
async fn test_unconfigured_client_is_absent() {
    let controller = in_memory_controller();
    assert_eq!(controller.get_client_quality_standards("nobody"), None);
}
