//! Test helpers shared by integration tests

use agent_quality::config::QualityConfig;
use agent_quality::feedback::{FeedbackStore, InMemoryFeedbackStore};
use agent_quality::routing::QualityController;
use std::sync::Arc;

/// Controller over a fresh in-memory store with default configuration
#[allow(dead_code)]
pub fn in_memory_controller() -> QualityController<InMemoryFeedbackStore> {
    controller_over(Arc::new(InMemoryFeedbackStore::default()))
}

/// Controller over `store` with default configuration
#[allow(dead_code)]
pub fn controller_over<S: FeedbackStore>(store: Arc<S>) -> QualityController<S> {
    QualityController::from_config(store, &QualityConfig::default())
}

/// Controller over a fresh in-memory store built from a TOML config
#[allow(dead_code)]
pub fn configured_controller(toml: &str) -> QualityController<InMemoryFeedbackStore> {
    let config = QualityConfig::from_toml_str(toml).unwrap();
    QualityController::in_memory(&config)
}

/// Record every `(agent, task_type, score)` triple
#[allow(dead_code)]
pub async fn seed<S: FeedbackStore>(
    controller: &QualityController<S>,
    feedback: &[(&str, &str, f64)],
) {
    for (agent_id, task_type, score) in feedback {
        controller
            .record_feedback(agent_id, task_type, *score)
            .await
            .unwrap();
    }
}
