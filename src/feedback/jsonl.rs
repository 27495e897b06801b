//! File-backed feedback ledger
//!
//! Persists every append as one JSON line and serves reads from an in-memory
//! index rebuilt at open. A record is written and flushed before it becomes
//! visible to readers, so the index never holds anything the file lacks.

use crate::error::{QualityError, QualityResult};
use crate::feedback::memory::InMemoryFeedbackStore;
use crate::feedback::store::{FeedbackLimits, FeedbackStore};
use crate::feedback::types::{AnonymizedFeedbackEntry, FeedbackRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One line of the ledger file
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum LedgerLine {
    Feedback(FeedbackRecord),
    Anonymized(AnonymizedFeedbackEntry),
}

/// Append-only JSON-lines implementation of [`FeedbackStore`]
#[derive(Debug)]
pub struct JsonlFeedbackStore {
    path: PathBuf,
    index: InMemoryFeedbackStore,
    writer: Mutex<File>,
}

impl JsonlFeedbackStore {
    /// Open (or create) the ledger at `path` and replay it into memory
    pub async fn open(path: impl AsRef<Path>, limits: FeedbackLimits) -> QualityResult<Self> {
        let path = path.as_ref().to_path_buf();
        let index = InMemoryFeedbackStore::new(limits);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(QualityError::store("open", e.to_string())),
        };

        let mut replayed = 0usize;
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: LedgerLine = serde_json::from_str(line).map_err(|e| {
                QualityError::store(
                    "open",
                    format!("{}: line {}: {e}", path.display(), line_no + 1),
                )
            })?;
            match entry {
                LedgerLine::Feedback(record) => index.publish_record(record),
                LedgerLine::Anonymized(entry) => index.publish_anonymized(entry),
            }
            replayed += 1;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| QualityError::store("open", e.to_string()))?;

        info!(
            "Opened feedback ledger {} ({} entries replayed)",
            path.display(),
            replayed
        );

        Ok(Self {
            path,
            index,
            writer: Mutex::new(file),
        })
    }

    /// Location of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of feedback records currently indexed
    pub fn record_count(&self) -> usize {
        self.index.record_count()
    }

    async fn write_line(file: &mut File, line: &LedgerLine, operation: &str) -> QualityResult<()> {
        let mut encoded =
            serde_json::to_string(line).map_err(|e| QualityError::store(operation, e.to_string()))?;
        encoded.push('\n');

        file.write_all(encoded.as_bytes())
            .await
            .map_err(|e| QualityError::store(operation, e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| QualityError::store(operation, e.to_string()))
    }
}

#[async_trait]
impl FeedbackStore for JsonlFeedbackStore {
    async fn append_feedback(
        &self,
        agent_id: &str,
        task_type: &str,
        score: f64,
    ) -> QualityResult<FeedbackRecord> {
        self.index
            .limits()
            .validate_feedback(agent_id, task_type, score)?;

        // Holding the writer while reserving keeps file order and sequence order identical.
        let mut file = self.writer.lock().await;
        let record =
            FeedbackRecord::new(agent_id, task_type, score, self.index.reserve_sequence());
        Self::write_line(
            &mut file,
            &LedgerLine::Feedback(record.clone()),
            "append_feedback",
        )
        .await?;

        self.index.publish_record(record.clone());
        debug!("Persisted feedback {} to {}", record.id, self.path.display());
        Ok(record)
    }

    async fn get_agent_feedback_history(
        &self,
        agent_id: &str,
        task_type: Option<&str>,
    ) -> QualityResult<Vec<FeedbackRecord>> {
        self.index
            .get_agent_feedback_history(agent_id, task_type)
            .await
    }

    async fn append_anonymized_feedback(
        &self,
        task_id: &str,
        content: &str,
        rating: f64,
    ) -> QualityResult<AnonymizedFeedbackEntry> {
        self.index.limits().validate_anonymized(task_id, rating)?;

        let entry = AnonymizedFeedbackEntry::new(task_id, content, rating);
        let mut file = self.writer.lock().await;
        Self::write_line(
            &mut file,
            &LedgerLine::Anonymized(entry.clone()),
            "append_anonymized_feedback",
        )
        .await?;

        self.index.publish_anonymized(entry.clone());
        Ok(entry)
    }

    async fn get_anonymized_feedback(
        &self,
        task_id: &str,
    ) -> QualityResult<Vec<AnonymizedFeedbackEntry>> {
        self.index.get_anonymized_feedback(task_id).await
    }
}
