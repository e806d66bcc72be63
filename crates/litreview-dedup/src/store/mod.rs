//! Record store collaborator.
//!
//! The pipeline only needs a narrow contract: insert, delete, candidate lookup
//! and listing. Each call is assumed atomic on its own; sequences such as
//! "look up duplicates, then insert" are not wrapped in a transaction.

mod memory;

pub use memory::InMemoryStore;

use crate::error::StoreResult;
use crate::models::{PartialRecord, Record};

/// Which records a call may see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProjectScope {
    /// Every record in the store.
    #[default]
    All,
    /// Records of a single project.
    Project(String),
}

impl ProjectScope {
    /// Scope for an optional project id.
    #[must_use]
    pub fn from_project(project_id: Option<&str>) -> Self {
        project_id.map_or(Self::All, |id| Self::Project(id.to_string()))
    }

    /// Whether a record is visible in this scope.
    #[must_use]
    pub fn contains(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Project(id) => record.project_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Filters for [`RecordStore::find_candidate_duplicates`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilters {
    /// Scope of the lookup.
    pub scope: ProjectScope,
    /// Match on DOI.
    pub by_doi: bool,
    /// Match on case-insensitive title.
    pub by_title: bool,
}

impl Default for CandidateFilters {
    fn default() -> Self {
        Self { scope: ProjectScope::All, by_doi: true, by_title: true }
    }
}

impl CandidateFilters {
    /// DOI and title lookups within a scope.
    #[must_use]
    pub fn in_scope(scope: ProjectScope) -> Self {
        Self { scope, ..Self::default() }
    }
}

/// Persistent record store.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return it with its assigned id.
    async fn insert(&self, record: PartialRecord, project_id: Option<&str>) -> StoreResult<Record>;

    /// Delete a record by id.
    async fn delete(&self, id: &str) -> StoreResult<()>;

    /// Records that may be equivalent to `record` by DOI or exact title.
    async fn find_candidate_duplicates(
        &self,
        record: &PartialRecord,
        filters: &CandidateFilters,
    ) -> StoreResult<Vec<Record>>;

    /// All records in scope, in insertion order.
    async fn list_all(&self, scope: &ProjectScope) -> StoreResult<Vec<Record>>;

    /// Cheap reachability check performed before a job starts consuming items.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
