//! Batch import job state and options.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::api;

/// Lifecycle of an import job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, not yet picked up by the worker.
    #[default]
    Queued,
    /// Worker is consuming chunks.
    Processing,
    /// Worker is suspended between chunks.
    Paused,
    /// All items processed.
    Completed,
    /// Whole-job fault; see `failure`.
    Failed,
    /// Stopped by the caller.
    Cancelled,
}

impl JobStatus {
    /// Terminal states never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Why a single item was not imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemErrorKind {
    /// An equivalent record already exists in the store.
    DuplicateDetected,
    /// The catalog has no record for the identifier.
    NotFound,
    /// The catalog request failed.
    FetchFailed,
    /// The duplicate lookup against the store failed; nothing was inserted.
    LookupFailed,
    /// The store rejected the insert.
    InsertFailed,
    /// The line is neither a catalog id nor a DOI.
    InvalidIdentifier,
}

impl ItemErrorKind {
    /// Worth retrying later without changing the input.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::FetchFailed | Self::LookupFailed | Self::InsertFailed)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateDetected => "duplicate-detected",
            Self::NotFound => "not-found",
            Self::FetchFailed => "fetch-failed",
            Self::LookupFailed => "lookup-failed",
            Self::InsertFailed => "insert-failed",
            Self::InvalidIdentifier => "invalid-identifier",
        }
    }
}

/// One per-item failure recorded on the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// Identifier, DOI or title of the failed item.
    pub item_ref: String,

    /// Failure category.
    pub kind: ItemErrorKind,

    /// Human-readable reason.
    pub reason: String,
}

/// Observable state of an import job.
///
/// Every snapshot satisfies `processed_items == successful_imports + failed_imports`
/// and `processed_items <= total_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchImportJob {
    /// Job id, also stamped on every imported record.
    pub id: Uuid,

    /// Current state.
    pub status: JobStatus,

    /// Number of items in the source.
    pub total_items: usize,

    /// Items with a final outcome.
    pub processed_items: usize,

    /// Items inserted into the store.
    pub successful_imports: usize,

    /// Items that were not inserted.
    pub failed_imports: usize,

    /// Per-item failures in processing order.
    pub errors: Vec<ItemError>,

    /// Number of chunks the source was split into.
    pub total_chunks: usize,

    /// Chunks fully processed.
    pub completed_chunks: usize,

    /// Whole-job fault, set only when `status` is `Failed`.
    #[serde(default)]
    pub failure: Option<String>,

    /// When the job was created.
    pub started_at: DateTime<Utc>,

    /// When the job reached a terminal state.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchImportJob {
    /// Fresh queued job.
    #[must_use]
    pub fn queued(id: Uuid) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            total_items: 0,
            processed_items: 0,
            successful_imports: 0,
            failed_imports: 0,
            errors: Vec::new(),
            total_chunks: 0,
            completed_chunks: 0,
            failure: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record a successful insert.
    pub fn record_success(&mut self) {
        self.successful_imports += 1;
        self.processed_items += 1;
    }

    /// Record a per-item failure.
    pub fn record_failure(&mut self, error: ItemError) {
        self.failed_imports += 1;
        self.processed_items += 1;
        self.errors.push(error);
    }

    /// Move to a terminal state and stamp `completed_at`.
    pub fn finish(&mut self, status: JobStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.completed_at = Some(Utc::now());
    }

    /// Percentage of items processed, 0..=100.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        if self.total_items == 0 {
            return if self.status == JobStatus::Completed { 100 } else { 0 };
        }
        ((self.processed_items * 100) / self.total_items) as u8
    }
}

/// Options for a single import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Items per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Delay between two consecutive catalog fetches.
    #[serde(default = "default_fetch_delay", with = "duration_millis")]
    pub fetch_delay: Duration,

    /// Skip items that already exist in the store.
    #[serde(default = "default_true")]
    pub check_duplicates: bool,

    /// Project stamped on imported records and used to scope duplicate lookups.
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_chunk_size() -> usize {
    api::CHUNK_SIZE
}

fn default_fetch_delay() -> Duration {
    api::FETCH_DELAY
}

fn default_true() -> bool {
    true
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            fetch_delay: default_fetch_delay(),
            check_duplicates: true,
            project_id: None,
        }
    }
}

impl ImportOptions {
    /// Options seeded from the pipeline configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self { chunk_size: config.chunk_size, fetch_delay: config.fetch_delay, ..Self::default() }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
