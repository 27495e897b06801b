//! Quality controller
//!
//! Routes tasks to the best-scored agent and records the feedback that drives
//! those decisions. The controller owns no persistent state: histories live
//! in the [`FeedbackStore`], client standards in the
//! [`QualityStandardsRegistry`]. Every store call is bounded by a timeout and
//! failures are returned to the caller without retry.
//!
//! # Example
//!
//! ```rust
//! use agent_quality::config::QualityConfig;
//! use agent_quality::routing::QualityController;
//!
//! # tokio_test::block_on(async {
//! let config = QualityConfig::default();
//! let controller = QualityController::in_memory(&config);
//!
//! controller.record_feedback("agent1", "task1", 0.8).await.unwrap();
//! controller.record_feedback("agent1", "task1", 0.9).await.unwrap();
//! controller.record_feedback("agent2", "task1", 0.7).await.unwrap();
//!
//! let winner = controller
//!     .route_task_to_best_agent("task1", &["agent1", "agent2"])
//!     .await
//!     .unwrap();
//! assert_eq!(winner, "agent1");
//! # });
//! ```

use crate::config::QualityConfig;
use crate::error::{QualityError, QualityResult};
use crate::feedback::{
    AnonymizedFeedbackEntry, FeedbackLimits, FeedbackRecord, FeedbackStore, InMemoryFeedbackStore,
};
use crate::observability::metrics::metrics;
use crate::routing::improvement::{ImprovementHook, NoopImprovementHook, TaskTypeSummary};
use crate::routing::selector::{select_best, CandidateScore, RoutingDecision};
use crate::scoring::{AgentScore, ScoringStrategy};
use crate::standards::{QualityStandard, QualityStandardsRegistry};
use crate::{feedback_span, routing_span};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// Routing policy derived from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingPolicy {
    /// Take the first candidate when nobody has evidence
    pub fallback_to_first_candidate: bool,
    /// Default bound on store calls
    pub store_timeout: Duration,
}

impl From<&QualityConfig> for RoutingPolicy {
    fn from(config: &QualityConfig) -> Self {
        Self {
            fallback_to_first_candidate: config.routing.fallback_to_first_candidate,
            store_timeout: config.routing.store_timeout(),
        }
    }
}

/// Orchestrates scoring, routing and feedback recording
#[derive(Debug)]
pub struct QualityController<S: FeedbackStore> {
    store: Arc<S>,
    standards: Arc<QualityStandardsRegistry>,
    strategy: ScoringStrategy,
    policy: RoutingPolicy,
    improvement: Arc<dyn ImprovementHook>,
}

impl<S: FeedbackStore> Clone for QualityController<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            standards: Arc::clone(&self.standards),
            strategy: self.strategy,
            policy: self.policy,
            improvement: Arc::clone(&self.improvement),
        }
    }
}

impl<S: FeedbackStore> QualityController<S> {
    /// Wire a controller over shared collaborators
    ///
    /// Only the `[scoring]` and `[routing]` policy is read from `config`. The
    /// store's limits and the registry's default threshold belong to the
    /// collaborators; use [`Self::from_config`] to build the registry from the
    /// same config.
    pub fn new(
        store: Arc<S>,
        standards: Arc<QualityStandardsRegistry>,
        config: &QualityConfig,
    ) -> Self {
        Self {
            store,
            standards,
            strategy: ScoringStrategy::from_config(&config.scoring),
            policy: RoutingPolicy::from(config),
            improvement: Arc::new(NoopImprovementHook),
        }
    }

    /// Wire a controller over `store`, building the standards registry with
    /// the configured default threshold
    pub fn from_config(store: Arc<S>, config: &QualityConfig) -> Self {
        let standards = QualityStandardsRegistry::new(config.routing.default_threshold);
        Self::new(store, Arc::new(standards), config)
    }

    /// Replace the continuous improvement hook
    pub fn with_improvement_hook(mut self, hook: Arc<dyn ImprovementHook>) -> Self {
        self.improvement = hook;
        self
    }

    /// Replace the scoring strategy
    pub fn with_strategy(mut self, strategy: ScoringStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn standards(&self) -> &Arc<QualityStandardsRegistry> {
        &self.standards
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    /// Run a store call under `timeout`, tagging expiry with `operation`
    async fn bounded<T, F>(&self, operation: &str, timeout: Duration, call: F) -> QualityResult<T>
    where
        F: Future<Output = QualityResult<T>>,
    {
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                match &e {
                    QualityError::Validation { .. } => metrics().validation_failed(),
                    QualityError::Store { .. } => metrics().store_failed(),
                    _ => {}
                }
                warn!("{} failed: {}", operation, e);
                Err(e)
            }
            Err(_) => {
                metrics().store_timed_out();
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!("{} timed out after {}ms", operation, timeout_ms);
                Err(QualityError::timeout(operation, timeout_ms))
            }
        }
    }

    async fn score_candidates(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
    ) -> QualityResult<Vec<CandidateScore>> {
        let mut scores = Vec::with_capacity(candidate_agent_ids.len());
        for agent_id in candidate_agent_ids {
            let history = self
                .store
                .get_agent_feedback_history(agent_id, Some(task_type))
                .await?;
            let score = self.strategy.score(&history);
            debug!("Scored candidate {} for {}: {:?}", agent_id, task_type, score);
            scores.push(CandidateScore::new(*agent_id, score));
        }
        Ok(scores)
    }

    /// Score every candidate for `task_type`, preserving input order
    pub async fn rank_candidates(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
    ) -> QualityResult<Vec<CandidateScore>> {
        self.rank_candidates_with_timeout(task_type, candidate_agent_ids, self.policy.store_timeout)
            .await
    }

    /// [`Self::rank_candidates`] with a caller-supplied bound on the whole read
    pub async fn rank_candidates_with_timeout(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
        timeout: Duration,
    ) -> QualityResult<Vec<CandidateScore>> {
        if candidate_agent_ids.is_empty() {
            return Err(QualityError::invalid_argument(format!(
                "no candidate agents supplied for task type '{task_type}'"
            )));
        }

        self.bounded(
            "get_agent_feedback_history",
            timeout,
            self.score_candidates(task_type, candidate_agent_ids),
        )
        .await
    }

    /// Pick the best agent for `task_type` and explain the choice
    pub async fn route_task(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
    ) -> QualityResult<RoutingDecision> {
        self.route_task_with_timeout(task_type, candidate_agent_ids, self.policy.store_timeout)
            .await
    }

    /// [`Self::route_task`] with a caller-supplied bound on the store reads
    pub async fn route_task_with_timeout(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
        timeout: Duration,
    ) -> QualityResult<RoutingDecision> {
        let span = routing_span!(task_type = %task_type, candidates = candidate_agent_ids.len());
        async move {
            let started = Instant::now();
            let result = self
                .rank_candidates_with_timeout(task_type, candidate_agent_ids, timeout)
                .await
                .and_then(|ranked| self.decide(task_type, ranked));

            match &result {
                Ok(decision) => {
                    metrics().route_decided(started.elapsed(), decision.fallback);
                    info!("{}", decision.reason);
                }
                Err(_) => metrics().route_failed(),
            }
            result
        }
        .instrument(span)
        .await
    }

    fn decide(
        &self,
        task_type: &str,
        mut ranked: Vec<CandidateScore>,
    ) -> QualityResult<RoutingDecision> {
        if let Some(index) = select_best(&ranked) {
            let winner = ranked.swap_remove(index);
            let reason = format!(
                "Selected agent '{}' for task type '{}' (score: {:.3} over {} samples)",
                winner.agent_id,
                task_type,
                winner.score.value().unwrap_or_default(),
                winner.score.samples()
            );
            return Ok(RoutingDecision {
                agent_id: winner.agent_id,
                score: winner.score,
                fallback: false,
                reason,
            });
        }

        if !self.policy.fallback_to_first_candidate {
            return Err(QualityError::invalid_argument(format!(
                "no candidate has feedback for task type '{task_type}' and fallback is disabled"
            )));
        }

        let first = ranked.swap_remove(0);
        let reason = format!(
            "No feedback for task type '{}'; falling back to first candidate '{}'",
            task_type, first.agent_id
        );
        Ok(RoutingDecision {
            agent_id: first.agent_id,
            score: AgentScore::NoData,
            fallback: true,
            reason,
        })
    }

    /// Identifier of the best agent for `task_type`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty candidate list, `Timeout` when the store
    /// does not answer in time, and any store error unchanged.
    pub async fn route_task_to_best_agent(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
    ) -> QualityResult<String> {
        Ok(self
            .route_task(task_type, candidate_agent_ids)
            .await?
            .agent_id)
    }

    /// [`Self::route_task_to_best_agent`] with a caller-supplied bound
    pub async fn route_task_to_best_agent_with_timeout(
        &self,
        task_type: &str,
        candidate_agent_ids: &[&str],
        timeout: Duration,
    ) -> QualityResult<String> {
        Ok(self
            .route_task_with_timeout(task_type, candidate_agent_ids, timeout)
            .await?
            .agent_id)
    }

    /// Append a scored observation for `agent_id` on `task_type`
    pub async fn record_feedback(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
    ) -> QualityResult<FeedbackRecord> {
        self.record_feedback_with_timeout(agent_id, task_type, score, self.policy.store_timeout)
            .await
    }

    /// [`Self::record_feedback`] with a caller-supplied bound
    pub async fn record_feedback_with_timeout(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
        timeout: Duration,
    ) -> QualityResult<FeedbackRecord> {
        let span = feedback_span!(agent_id = %agent_id, task_type = %task_type);
        async move {
            let record = self
                .bounded(
                    "append_feedback",
                    timeout,
                    self.store.append_feedback(agent_id, task_type, score),
                )
                .await?;
            metrics().feedback_recorded();
            debug!("Recorded feedback {} (score {})", record.id, record.score);
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Append anonymized client feedback for `task_id`
    pub async fn record_anonymized_feedback(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
    ) -> QualityResult<AnonymizedFeedbackEntry> {
        self.record_anonymized_feedback_with_timeout(
            task_id,
            content,
            rating,
            self.policy.store_timeout,
        )
        .await
    }

    /// [`Self::record_anonymized_feedback`] with a caller-supplied bound
    pub async fn record_anonymized_feedback_with_timeout(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
        timeout: Duration,
    ) -> QualityResult<AnonymizedFeedbackEntry> {
        let entry = self
            .bounded(
                "append_anonymized_feedback",
                timeout,
                self.store.append_anonymized_feedback(task_id, content, rating),
            )
            .await?;
        metrics().anonymized_feedback_recorded();
        debug!("Recorded anonymized feedback for task {}", task_id);
        Ok(entry)
    }

    /// History for `agent_id`, optionally restricted to one task type
    pub async fn get_agent_feedback_history(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> QualityResult<Vec<FeedbackRecord>> {
        self.get_agent_feedback_history_with_timeout(agent_id, task_type, self.policy.store_timeout)
            .await
    }

    /// [`Self::get_agent_feedback_history`] with a caller-supplied bound
    pub async fn get_agent_feedback_history_with_timeout(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
        timeout: Duration,
    ) -> QualityResult<Vec<FeedbackRecord>> {
        self.bounded(
            "get_agent_feedback_history",
            timeout,
            self.store.get_agent_feedback_history(agent_id, task_type),
        )
        .await
    }

    /// Anonymized feedback for `task_id` in insertion order
    pub async fn get_anonymized_feedback(
        &self,
        task_id: &str,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>> {
        self.get_anonymized_feedback_with_timeout(task_id, self.policy.store_timeout)
            .await
    }

    /// [`Self::get_anonymized_feedback`] with a caller-supplied bound
    pub async fn get_anonymized_feedback_with_timeout(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>> {
        self.bounded(
            "get_anonymized_feedback",
            timeout,
            self.store.get_anonymized_feedback(task_id),
        )
        .await
    }

    /// Replace the quality standard for `client_id`
    pub fn set_client_quality_standards(&self, client_id: &str, standard: QualityStandard) {
        self.standards.set_standard(client_id, standard);
    }

    /// Standard for `client_id`, `None` when nothing is configured
    pub fn get_client_quality_standards(&self, client_id: &str) -> Option<QualityStandard> {
        self.standards.get_standard(client_id)
    }

    /// Whether `agent_id` meets the threshold `client_id` expects for `task_type`
    ///
    /// Agents without feedback never meet a threshold. With no client or
    /// system threshold configured, any scored agent is accepted.
    pub async fn meets_client_standard(
        &self,
        client_id: &str,
        agent_id: &str,
        task_type: &str,
    ) -> QualityResult<bool> {
        self.meets_client_standard_with_timeout(
            client_id,
            agent_id,
            task_type,
            self.policy.store_timeout,
        )
        .await
    }

    /// [`Self::meets_client_standard`] with a caller-supplied bound on the read
    pub async fn meets_client_standard_with_timeout(
        &self,
        client_id: &str,
        agent_id: &str,
        task_type: &str,
        timeout: Duration,
    ) -> QualityResult<bool> {
        let history = self
            .get_agent_feedback_history_with_timeout(agent_id, Some(task_type), timeout)
            .await?;
        let score = self.strategy.score(&history);

        Ok(match (score.value(), self.standards.threshold_for(client_id)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(value), Some(threshold)) => value >= threshold,
        })
    }

    /// Extension point for learning from an agent's accumulated feedback
    ///
    /// Never fails and never writes to either store. If the history cannot be
    /// read the hook is skipped and the failure is logged.
    pub async fn apply_continuous_improvement(&self, agent_id: &str) {
        let history = match self.get_agent_feedback_history(agent_id, None).await {
            Ok(history) => history,
            Err(e) => {
                warn!(
                    "Skipping continuous improvement for agent {}: {}",
                    agent_id, e
                );
                return;
            }
        };

        let summaries = summarize_by_task_type(&history, &self.strategy);
        self.improvement.on_agent_summary(agent_id, &summaries);
    }
}

impl QualityController<InMemoryFeedbackStore> {
    /// Controller over a fresh in-memory store, with store limits and the
    /// default threshold taken from `config`
    pub fn in_memory(config: &QualityConfig) -> Self {
        let store = InMemoryFeedbackStore::new(FeedbackLimits::from(&config.feedback));
        Self::from_config(Arc::new(store), config)
    }
}

/// Per-task-type scores in order of first appearance
fn summarize_by_task_type(
    history: &[FeedbackRecord],
    strategy: &ScoringStrategy,
) -> Vec<TaskTypeSummary> {
    let mut task_types: Vec<&str> = Vec::new();
    for record in history {
        if !task_types.contains(&record.task_type.as_str()) {
            task_types.push(&record.task_type);
        }
    }

    task_types
        .into_iter()
        .map(|task_type| {
            let records: Vec<FeedbackRecord> = history
                .iter()
                .filter(|record| record.task_type == task_type)
                .cloned()
                .collect();
            TaskTypeSummary {
                task_type: task_type.to_string(),
                score: strategy.score(&records),
            }
        })
        .collect()
}
