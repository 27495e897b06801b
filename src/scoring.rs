//! Agent scoring
//!
//! Reduces a feedback history to one comparable value. An empty history is
//! reported as [`AgentScore::NoData`], never as a number, so an agent without
//! evidence cannot be mistaken for one with a zero or perfect score.

use crate::config::{ScoringSection, ScoringStrategyKind};
use crate::feedback::FeedbackRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

/// Result of scoring one agent's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentScore {
    /// At least one record contributed
    Scored { value: f64, samples: usize },
    /// History was empty
    NoData,
}

impl AgentScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            AgentScore::Scored { value, .. } => Some(*value),
            AgentScore::NoData => None,
        }
    }

    pub fn samples(&self) -> usize {
        match self {
            AgentScore::Scored { samples, .. } => *samples,
            AgentScore::NoData => 0,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, AgentScore::NoData)
    }

    /// Ranking order: `NoData` sits below every scored value
    pub fn rank_cmp(&self, other: &AgentScore) -> Ordering {
        match (self.value(), other.value()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        }
    }

    /// True when `self` ranks strictly above `other`
    pub fn outranks(&self, other: &AgentScore) -> bool {
        self.rank_cmp(other) == Ordering::Greater
    }
}

/// History reduction strategy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ScoringStrategy {
    /// Arithmetic mean of every score
    #[default]
    Mean,
    /// Exponentially decayed mean, weighting each record by its age relative
    /// to the newest record. Equal timestamps reduce to the plain mean.
    RecencyWeighted { half_life: Duration },
}

impl ScoringStrategy {
    /// Build the strategy described by a validated config section
    pub fn from_config(section: &ScoringSection) -> Self {
        match (section.strategy, section.half_life_secs) {
            (ScoringStrategyKind::RecencyWeighted, Some(secs)) if secs > 0 => {
                ScoringStrategy::RecencyWeighted {
                    half_life: Duration::from_secs(secs),
                }
            }
            _ => ScoringStrategy::Mean,
        }
    }

    /// Reduce `history` to a score. Deterministic and side-effect free.
    pub fn score(&self, history: &[FeedbackRecord]) -> AgentScore {
        if history.is_empty() {
            return AgentScore::NoData;
        }

        let value = match self {
            ScoringStrategy::Mean => mean(history),
            ScoringStrategy::RecencyWeighted { half_life } => {
                recency_weighted_mean(history, *half_life)
            }
        };

        AgentScore::Scored {
            value,
            samples: history.len(),
        }
    }
}

fn mean(history: &[FeedbackRecord]) -> f64 {
    running_mean(history.iter().map(|record| (record.score, 1.0)))
}

fn recency_weighted_mean(history: &[FeedbackRecord], half_life: Duration) -> f64 {
    let half_life_secs = half_life.as_secs_f64();
    let Some(newest) = history.iter().map(|record| record.timestamp).max() else {
        return 0.0;
    };

    running_mean(history.iter().map(|record| {
        let age_secs = (newest - record.timestamp).num_milliseconds() as f64 / 1000.0;
        (record.score, 0.5_f64.powf(age_secs / half_life_secs))
    }))
}

/// Weighted mean of `(value, weight)` pairs, updated one pair at a time.
///
/// Each step is a convex combination of the running mean and the next value,
/// so the result stays within the range of the inputs and never overflows
/// even when a plain sum of in-range scores would. Zero weights are skipped.
fn running_mean(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut mean = 0.0;
    let mut total_weight = 0.0;
    for (value, weight) in pairs {
        if weight <= 0.0 {
            continue;
        }
        total_weight += weight;
        let share = weight / total_weight;
        mean = mean * (1.0 - share) + value * share;
    }
    mean
}
