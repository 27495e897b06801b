//! Candidate selection
//!
//! Pure selection over already-scored candidates. The winner is the candidate
//! with the strictly highest score; ties go to the earliest candidate in input
//! order. Candidates without data rank below every scored candidate.

use crate::scoring::AgentScore;
use serde::{Deserialize, Serialize};

/// One candidate and its score for the task type being routed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub agent_id: String,
    pub score: AgentScore,
}

impl CandidateScore {
    pub fn new(agent_id: impl Into<String>, score: AgentScore) -> Self {
        Self {
            agent_id: agent_id.into(),
            score,
        }
    }
}

/// Outcome of a routing call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Selected agent
    pub agent_id: String,
    /// Score the selection was based on
    pub score: AgentScore,
    /// True when no candidate had evidence and the first candidate was taken
    pub fallback: bool,
    /// Human-readable explanation
    pub reason: String,
}

/// Index of the best-scored candidate, or `None` when none has data
pub fn select_best(candidates: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.score.is_no_data() {
            continue;
        }
        match best {
            Some(current) if !candidate.score.outranks(&candidates[current].score) => {}
            _ => best = Some(index),
        }
    }

    best
}
