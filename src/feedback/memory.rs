//! In-memory feedback ledger
//!
//! Histories live in an arena keyed by agent and task type. Each key owns its
//! own lock, so appends for unrelated agents never serialize behind each
//! other; the outer map lock is only taken for writing when a new key is
//! created. Readers clone the slot under a read lock and therefore always see
//! whole records.

use crate::error::QualityResult;
use crate::feedback::store::{FeedbackLimits, FeedbackStore};
use crate::feedback::types::{AnonymizedFeedbackEntry, FeedbackRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Slot<T> = Arc<RwLock<Vec<T>>>;

/// agent_id -> task_type -> history
type HistoryArena = HashMap<String, HashMap<String, Slot<FeedbackRecord>>>;

/// Thread-safe in-memory implementation of [`FeedbackStore`]
#[derive(Debug, Clone)]
pub struct InMemoryFeedbackStore {
    limits: FeedbackLimits,
    histories: Arc<RwLock<HistoryArena>>,
    anonymized: Arc<RwLock<HashMap<String, Slot<AnonymizedFeedbackEntry>>>>,
    next_sequence: Arc<AtomicU64>,
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new(FeedbackLimits::default())
    }
}

// Slots only ever grow by whole elements, so a poisoned lock still guards
// consistent data.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryFeedbackStore {
    /// Create an empty store validating against `limits`
    pub fn new(limits: FeedbackLimits) -> Self {
        Self {
            limits,
            histories: Arc::new(RwLock::new(HashMap::new())),
            anonymized: Arc::new(RwLock::new(HashMap::new())),
            next_sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Limits this store validates against
    pub fn limits(&self) -> FeedbackLimits {
        self.limits
    }

    /// Number of feedback records across all agents
    pub fn record_count(&self) -> usize {
        let histories = read(&self.histories);
        histories
            .values()
            .flat_map(|by_type| by_type.values())
            .map(|slot| read(slot).len())
            .sum()
    }

    /// Number of agents with at least one record
    pub fn agent_count(&self) -> usize {
        read(&self.histories).len()
    }

    fn history_slot(&self, agent_id: &str, task_type: &str) -> Slot<FeedbackRecord> {
        if let Some(slot) = read(&self.histories)
            .get(agent_id)
            .and_then(|by_type| by_type.get(task_type))
        {
            return Arc::clone(slot);
        }

        let mut histories = write(&self.histories);
        let slot = histories
            .entry(agent_id.to_string())
            .or_default()
            .entry(task_type.to_string())
            .or_insert_with(|| {
                debug!("Creating history slot for {}/{}", agent_id, task_type);
                Arc::new(RwLock::new(Vec::new()))
            });
        Arc::clone(slot)
    }

    fn anonymized_slot(&self, task_id: &str) -> Slot<AnonymizedFeedbackEntry> {
        if let Some(slot) = read(&self.anonymized).get(task_id) {
            return Arc::clone(slot);
        }

        let mut anonymized = write(&self.anonymized);
        Arc::clone(
            anonymized
                .entry(task_id.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(Vec::new()))),
        )
    }

    /// Reserve the next insertion sequence number
    pub(crate) fn reserve_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish a fully built record without validation
    ///
    /// Used by backends that persist first and index second. Keeps the
    /// sequence counter ahead of every published record.
    pub(crate) fn publish_record(&self, record: FeedbackRecord) {
        self.next_sequence
            .fetch_max(record.sequence + 1, Ordering::SeqCst);
        let slot = self.history_slot(&record.agent_id, &record.task_type);
        write(&slot).push(record);
    }

    /// Publish a fully built anonymized entry without validation
    pub(crate) fn publish_anonymized(&self, entry: AnonymizedFeedbackEntry) {
        let slot = self.anonymized_slot(&entry.task_id);
        write(&slot).push(entry);
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn append_feedback(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
    ) -> QualityResult<FeedbackRecord> {
        self.limits.validate_feedback(agent_id, task_type, score)?;

        let slot = self.history_slot(agent_id, task_type);
        let mut history = write(&slot);
        // Sequence is taken under the slot lock so per-key order matches it.
        let record = FeedbackRecord::new(agent_id, task_type, score, self.reserve_sequence());
        history.push(record.clone());

        debug!(
            "Appended feedback for {}/{}: score={} seq={}",
            agent_id, task_type, score, record.sequence
        );
        Ok(record)
    }

    /// Records for `agent_id`, oldest first
    ///
    /// Every slot read guard is taken under the arena read lock before any
    /// record is cloned. Appends reserve their sequence under the slot write
    /// lock and new slots need the arena write lock, so the result is a
    /// consistent cut: if it contains a record it also contains every record
    /// whose append completed before that one was sequenced.
    async fn get_agent_feedback_history(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> QualityResult<Vec<FeedbackRecord>> {
        let histories = read(&self.histories);
        let Some(by_type) = histories.get(agent_id) else {
            return Ok(Vec::new());
        };

        let guards: Vec<RwLockReadGuard<'_, Vec<FeedbackRecord>>> = match task_type {
            Some(task_type) => by_type.get(task_type).map(|slot| read(slot)).into_iter().collect(),
            None => by_type.values().map(|slot| read(slot)).collect(),
        };

        let mut records: Vec<FeedbackRecord> = guards
            .iter()
            .flat_map(|history| history.iter().cloned())
            .collect();
        let merged = guards.len() > 1;
        drop(guards);
        drop(histories);

        if merged {
            records.sort_by_key(|record| record.sequence);
        }

        Ok(records)
    }

    async fn append_anonymized_feedback(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
    ) -> QualityResult<AnonymizedFeedbackEntry> {
        self.limits.validate_anonymized(task_id, rating)?;

        let entry = AnonymizedFeedbackEntry::new(task_id, content, rating);
        self.publish_anonymized(entry.clone());

        debug!("Appended anonymized feedback for task {}", task_id);
        Ok(entry)
    }

    async fn get_anonymized_feedback(
        &self,
        task_id: &str,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>> {
        let slot = match read(&self.anonymized).get(task_id) {
            Some(slot) => Arc::clone(slot),
            None => return Ok(Vec::new()),
        };
        let entries = read(&slot).clone();
        Ok(entries)
    }
}
