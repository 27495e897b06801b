//! Collaborator failure tests
//!
//! Store errors reach the caller tagged with the failing operation, slow
//! stores surface as timeouts instead of partial routing decisions, and
//! nothing is retried behind the caller's back.

use agent_quality::config::QualityConfig;
use agent_quality::error::QualityError;
use agent_quality::routing::{ImprovementHook, QualityController, TaskTypeSummary};
use agent_quality::testing::MockFeedbackStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn controller_with(
    store: MockFeedbackStore,
    config: &QualityConfig,
) -> QualityController<MockFeedbackStore> {
    QualityController::from_config(Arc::new(store), config)
}

#[tokio::test]
async fn test_store_failure_propagates_with_operation() {
    let controller = controller_with(MockFeedbackStore::with_failure(), &QualityConfig::default());

    let err = controller
        .route_task_to_best_agent("task1", &["agent1"])
        .await
        .unwrap_err();

    assert!(matches!(err, QualityError::Store { .. }));
    assert_eq!(err.operation(), Some("get_agent_feedback_history"));
}

#[tokio::test]
async fn test_failed_append_is_not_retried() {
    let controller = controller_with(MockFeedbackStore::with_failure(), &QualityConfig::default());

    let err = controller
        .record_feedback("agent1", "task1", 0.5)
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Some("append_feedback"));
    assert_eq!(controller.store().append_count(), 1);
}

#[tokio::test]
async fn test_anonymized_store_failure_propagates() {
    let controller = controller_with(MockFeedbackStore::with_failure(), &QualityConfig::default());

    let err = controller
        .record_anonymized_feedback("task1", "ok", 3.0)
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Some("append_anonymized_feedback"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out_routing() {
    let config = QualityConfig::from_toml_str("[routing]\nstore_timeout_ms = 50\n").unwrap();
    let controller = controller_with(
        MockFeedbackStore::with_delay(Duration::from_secs(10)),
        &config,
    );

    let err = controller
        .route_task_to_best_agent("task1", &["agent1", "agent2"])
        .await
        .unwrap_err();

    match err {
        QualityError::Timeout {
            operation,
            timeout_ms,
        } => {
            assert_eq!(operation, "get_agent_feedback_history");
            assert_eq!(timeout_ms, 50);
        }
        other => panic!("Expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_caller_supplied_timeout_overrides_default() {
    let controller = controller_with(
        MockFeedbackStore::with_delay(Duration::from_millis(200)),
        &QualityConfig::default(),
    );

    let short = controller
        .route_task_to_best_agent_with_timeout("task1", &["agent1"], Duration::from_millis(10))
        .await;
    assert!(matches!(short, Err(QualityError::Timeout { .. })));

    let long = controller
        .route_task_to_best_agent_with_timeout("task1", &["agent1"], Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(long, "agent1");
}

#[tokio::test(start_paused = true)]
async fn test_slow_append_times_out() {
    let controller = controller_with(
        MockFeedbackStore::with_delay(Duration::from_secs(1)),
        &QualityConfig::default(),
    );

    let result = controller
        .record_feedback_with_timeout("agent1", "task1", 0.5, Duration::from_millis(5))
        .await;

    assert!(matches!(result, Err(QualityError::Timeout { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_slow_anonymized_append_times_out() {
    let controller = controller_with(
        MockFeedbackStore::with_delay(Duration::from_secs(1)),
        &QualityConfig::default(),
    );

    let err = controller
        .record_anonymized_feedback_with_timeout("task1", "fine", 4.0, Duration::from_millis(5))
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Some("append_anonymized_feedback"));
    assert!(matches!(err, QualityError::Timeout { timeout_ms: 5, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_history_reads_honour_caller_timeout() {
    let controller = controller_with(
        MockFeedbackStore::with_delay(Duration::from_millis(200)),
        &QualityConfig::default(),
    );

    let history = controller
        .get_agent_feedback_history_with_timeout("agent1", None, Duration::from_millis(10))
        .await;
    assert!(matches!(history, Err(QualityError::Timeout { .. })));

    let feedback = controller
        .get_anonymized_feedback_with_timeout("task1", Duration::from_millis(10))
        .await
        .unwrap_err();
    assert_eq!(feedback.operation(), Some("get_anonymized_feedback"));

    let meets = controller
        .meets_client_standard_with_timeout("client1", "agent1", "task1", Duration::from_millis(10))
        .await;
    assert!(matches!(meets, Err(QualityError::Timeout { .. })));

    let within = controller
        .get_agent_feedback_history_with_timeout("agent1", None, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(within.is_empty());
}

#[derive(Debug, Default)]
struct CountingHook {
    calls: AtomicUsize,
}

impl ImprovementHook for CountingHook {
    fn on_agent_summary(&self, _agent_id: &str, _summaries: &[TaskTypeSummary]) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_continuous_improvement_never_fails_on_store_error() {
    let hook = Arc::new(CountingHook::default());
    let controller = controller_with(MockFeedbackStore::with_failure(), &QualityConfig::default())
        .with_improvement_hook(hook.clone());

    controller.apply_continuous_improvement("agent1").await;

    assert_eq!(hook.calls.load(Ordering::SeqCst), 0);
}
