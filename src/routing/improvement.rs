//! Continuous improvement extension point
//!
//! The controller hands a read-only per-task-type summary of an agent's
//! history to an [`ImprovementHook`]. Hooks may keep whatever derived state
//! they like but have no access to the feedback ledger or the standards
//! registry.

use crate::scoring::AgentScore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Aggregated view of one agent's history for one task type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTypeSummary {
    pub task_type: String,
    pub score: AgentScore,
}

/// Receiver of per-agent summaries from `apply_continuous_improvement`
pub trait ImprovementHook: Send + Sync + std::fmt::Debug {
    fn on_agent_summary(&self, agent_id: &str, summaries: &[TaskTypeSummary]);
}

/// Default hook: logs the summary and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopImprovementHook;

impl ImprovementHook for NoopImprovementHook {
    fn on_agent_summary(&self, agent_id: &str, summaries: &[TaskTypeSummary]) {
        debug!(
            "Continuous improvement for agent {}: {} task types",
            agent_id,
            summaries.len()
        );
    }
}
