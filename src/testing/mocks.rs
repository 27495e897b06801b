//! Mock implementations for testing
//!
//! `MockFeedbackStore` behaves like the in-memory store but can be told to
//! fail every call or to stall before answering, and counts the calls it
//! receives.

use crate::error::{QualityError, QualityResult};
use crate::feedback::{
    AnonymizedFeedbackEntry, FeedbackLimits, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock feedback store for testing
#[derive(Debug, Default)]
pub struct MockFeedbackStore {
    pub inner: InMemoryFeedbackStore,
    pub should_fail: bool,
    pub delay: Option<Duration>,
    pub appends: AtomicUsize,
    pub reads: AtomicUsize,
}

impl MockFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: FeedbackLimits) -> Self {
        Self {
            inner: InMemoryFeedbackStore::new(limits),
            ..Default::default()
        }
    }

    /// Every call fails with a store error
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Every call stalls for `delay` before answering
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    async fn before_call(&self, operation: &str) -> QualityResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(QualityError::store(operation, "mock store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for MockFeedbackStore {
    async fn append_feedback(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
    ) -> QualityResult<FeedbackRecord> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.before_call("append_feedback").await?;
        self.inner.append_feedback(agent_id, task_type, score).await
    }

    async fn get_agent_feedback_history(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> QualityResult<Vec<FeedbackRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.before_call("get_agent_feedback_history").await?;
        self.inner
            .get_agent_feedback_history(agent_id, task_type)
            .await
    }

    async fn append_anonymized_feedback(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
    ) -> QualityResult<AnonymizedFeedbackEntry> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.before_call("append_anonymized_feedback").await?;
        self.inner
            .append_anonymized_feedback(task_id, content, rating)
            .await
    }

    async fn get_anonymized_feedback(
        &self,
        task_id: &str,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.before_call("get_anonymized_feedback").await?;
        self.inner.get_anonymized_feedback(task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_passes_through() {
        let store = MockFeedbackStore::new();
        store.append_feedback("agent1", "task1", 0.4).await.unwrap();

        let history = store
            .get_agent_feedback_history("agent1", Some("task1"))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(store.append_count(), 1);
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_failure_is_tagged() {
        let store = MockFeedbackStore::with_failure();
        let err = store.get_anonymized_feedback("task1").await.unwrap_err();
        assert_eq!(err.operation(), Some("get_anonymized_feedback"));
    }
}
