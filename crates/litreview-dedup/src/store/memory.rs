//! In-memory record store with optional JSON persistence.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{CandidateFilters, ProjectScope, RecordStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{Bibliographic, PartialRecord, Record};

/// Insertion-ordered record store behind a `tokio` read/write lock.
///
/// Cloning is cheap and clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
}

impl InMemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with existing records.
    #[must_use]
    pub fn with_records(records: Vec<Record>) -> Self {
        Self { records: Arc::new(RwLock::new(records)) }
    }

    /// Load a corpus from a JSON array of records. A missing file yields an empty store.
    pub async fn load_json(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Corpus file missing, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<Record> = serde_json::from_slice(&raw)?;
        tracing::debug!(path = %path.display(), records = records.len(), "Loaded corpus");
        Ok(Self::with_records(records))
    }

    /// Write all records as a pretty-printed JSON array.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let json = {
            let records = self.records.read().await;
            serde_json::to_vec_pretty(&*records)?
        };
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Look up a record by id.
    pub async fn get(&self, id: &str) -> Option<Record> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryStore {
    async fn insert(&self, record: PartialRecord, project_id: Option<&str>) -> StoreResult<Record> {
        if record.title.trim().is_empty() {
            return Err(StoreError::conflict("record has no title"));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let record = record.into_record(id, project_id.map(str::to_string));

        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn find_candidate_duplicates(
        &self,
        record: &PartialRecord,
        filters: &CandidateFilters,
    ) -> StoreResult<Vec<Record>> {
        let doi = Bibliographic::doi(record).filter(|_| filters.by_doi);
        let title = Some(record.title.trim().to_lowercase())
            .filter(|t| filters.by_title && !t.is_empty());

        let records = self.records.read().await;
        let candidates = records
            .iter()
            .filter(|existing| filters.scope.contains(existing))
            .filter(|existing| {
                let doi_match = matches!(
                    (doi, Bibliographic::doi(*existing)),
                    (Some(a), Some(b)) if a.eq_ignore_ascii_case(b)
                );
                let title_match =
                    title.as_deref().is_some_and(|t| existing.title.trim().to_lowercase() == t);
                doi_match || title_match
            })
            .cloned()
            .collect();

        Ok(candidates)
    }

    async fn list_all(&self, scope: &ProjectScope) -> StoreResult<Vec<Record>> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| scope.contains(r)).cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish()
    }
}
