//! Storage collaborator contract
//!
//! The routing core needs exactly four operations from whatever persists the
//! feedback ledger. Implementations must validate input with
//! [`FeedbackLimits`], keep histories in insertion order, and never expose a
//! partially written record to a concurrent reader.

use crate::config::FeedbackSection;
use crate::error::{QualityError, QualityResult};
use crate::feedback::types::{AnonymizedFeedbackEntry, FeedbackRecord};
use async_trait::async_trait;

/// Persistence operations required by the routing core
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Append one scored observation for `agent_id` on `task_type`
    ///
    /// # Errors
    ///
    /// `QualityError::Validation` for an empty identifier or an out-of-range score.
    async fn append_feedback(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
    ) -> QualityResult<FeedbackRecord>;

    /// All records for `agent_id`, optionally restricted to one task type,
    /// in insertion order. Unknown agents yield an empty vector.
    async fn get_agent_feedback_history(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> QualityResult<Vec<FeedbackRecord>>;

    /// Append anonymized client feedback for `task_id`
    async fn append_anonymized_feedback(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
    ) -> QualityResult<AnonymizedFeedbackEntry>;

    /// Anonymized feedback for `task_id` in insertion order
    async fn get_anonymized_feedback(
        &self,
        task_id: &str,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>>;
}

/// Valid input ranges shared by every store implementation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackLimits {
    pub min_score: f64,
    pub max_score: f64,
    pub min_rating: f64,
    pub max_rating: f64,
}

impl Default for FeedbackLimits {
    fn default() -> Self {
        Self::from(&FeedbackSection::default())
    }
}

impl From<&FeedbackSection> for FeedbackLimits {
    fn from(section: &FeedbackSection) -> Self {
        Self {
            min_score: section.min_score,
            max_score: section.max_score,
            min_rating: section.min_rating,
            max_rating: section.max_rating,
        }
    }
}

impl FeedbackLimits {
    /// Check an agent feedback submission
    pub fn validate_feedback(&self, agent_id: &str, task_type: &str, score: f64) -> QualityResult<()> {
        require_non_empty("agent_id", agent_id)?;
        require_non_empty("task_type", task_type)?;

        if !score.is_finite() || score < self.min_score || score > self.max_score {
            return Err(QualityError::validation(format!(
                "score {score} is outside [{}, {}]",
                self.min_score, self.max_score
            )));
        }
        Ok(())
    }

    /// Check an anonymized feedback submission
    pub fn validate_anonymized(&self, task_id: &str, rating: f64) -> QualityResult<()> {
        require_non_empty("task_id", task_id)?;

        if !rating.is_finite() || rating < self.min_rating || rating > self.max_rating {
            return Err(QualityError::validation(format!(
                "rating {rating} is outside [{}, {}]",
                self.min_rating, self.max_rating
            )));
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> QualityResult<()> {
    if value.trim().is_empty() {
        return Err(QualityError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = FeedbackLimits::default();
        assert_eq!(limits.min_score, 0.0);
        assert_eq!(limits.max_score, 1.0);
        assert_eq!(limits.min_rating, 1.0);
        assert_eq!(limits.max_rating, 5.0);
    }

    #[test]
    fn test_score_bounds_are_inclusive() {
        let limits = FeedbackLimits::default();
        assert!(limits.validate_feedback("a", "t", 0.0).is_ok());
        assert!(limits.validate_feedback("a", "t", 1.0).is_ok());
        assert!(limits.validate_feedback("a", "t", 1.5).is_err());
        assert!(limits.validate_feedback("a", "t", -0.1).is_err());
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let limits = FeedbackLimits::default();
        assert!(matches!(
            limits.validate_feedback("a", "t", f64::NAN),
            Err(QualityError::Validation { .. })
        ));
        assert!(limits.validate_feedback("a", "t", f64::INFINITY).is_err());
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let limits = FeedbackLimits::default();
        assert!(limits.validate_feedback("", "t", 0.5).is_err());
        assert!(limits.validate_feedback("a", "  ", 0.5).is_err());
        assert!(limits.validate_anonymized("", 3.0).is_err());
    }

    #[test]
    fn test_rating_scale() {
        let limits = FeedbackLimits::default();
        assert!(limits.validate_anonymized("task1", 1.0).is_ok());
        assert!(limits.validate_anonymized("task1", 5.0).is_ok());
        assert!(limits.validate_anonymized("task1", 0.0).is_err());
        assert!(limits.validate_anonymized("task1", 6.0).is_err());
    }

    #[test]
    fn test_limits_from_config_section() {
        let section = FeedbackSection {
            min_score: 0.0,
            max_score: 100.0,
            min_rating: 0.0,
            max_rating: 10.0,
        };
        let limits = FeedbackLimits::from(&section);
        assert!(limits.validate_feedback("a", "t", 87.0).is_ok());
        assert!(limits.validate_anonymized("task", 0.0).is_ok());
    }
}
