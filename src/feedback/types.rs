//! Feedback ledger record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scored observation of an agent's performance on a task type
///
/// Records are immutable once published by a store. `sequence` is assigned by
/// the store and increases with every append, so records from different task
/// types can be merged back into insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    /// Unique record identifier
    pub id: Uuid,
    /// Agent that performed the task
    pub agent_id: String,
    /// Category of task the score applies to
    pub task_type: String,
    /// Quality score within the configured range
    pub score: f64,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Store-assigned insertion sequence
    pub sequence: u64,
}

impl FeedbackRecord {
    /// Create a record stamped with the current time
    pub fn new(agent_id: &str, task_type: &str, score: f64, sequence: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            task_type: task_type.to_string(),
            score,
            timestamp: Utc::now(),
            sequence,
        }
    }

    /// Override the creation time (used when replaying or backfilling)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Free-text client feedback attached to a task
///
/// The content is stored as given. Callers are responsible for stripping
/// identifying information before submitting it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnonymizedFeedbackEntry {
    pub task_id: String,
    pub content: String,
    pub rating: f64,
    pub timestamp: DateTime<Utc>,
}

impl AnonymizedFeedbackEntry {
    pub fn new(task_id: &str, content: &str, rating: f64) -> Self {
        Self {
            task_id: task_id.to_string(),
            content: content.to_string(),
            rating,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_ids_are_unique() {
        let a = FeedbackRecord::new("agent1", "task1", 0.5, 1);
        let b = FeedbackRecord::new("agent1", "task1", 0.5, 2);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_with_timestamp_overrides_creation_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let record = FeedbackRecord::new("agent1", "task1", 0.9, 1).with_timestamp(ts);
        assert_eq!(record.timestamp, ts);
        assert_eq!(record.score, 0.9);
    }

    #[test]
    fn test_record_json_shape() {
        let record = FeedbackRecord::new("agent1", "summarize", 0.8, 7);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["agent_id"], "agent1");
        assert_eq!(json["task_type"], "summarize");
        assert_eq!(json["score"], 0.8);
        assert_eq!(json["sequence"], 7);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_anonymized_entry_preserves_content() {
        let entry = AnonymizedFeedbackEntry::new("task1", "Great job!", 5.0);
        assert_eq!(entry.task_id, "task1");
        assert_eq!(entry.content, "Great job!");
        assert_eq!(entry.rating, 5.0);
    }
}
