//! External catalog collaborator.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClientResult;
use crate::models::PartialRecord;

/// Pure numeric catalog identifier (PMID).
static NUMERIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid numeric id pattern"));

/// DOI prefix: `10.` followed by digits.
static DOI_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^10\.[0-9]+").expect("valid DOI pattern"));

/// An identifier the catalog can resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogId {
    /// PubMed id.
    Pmid(String),
    /// Digital Object Identifier.
    Doi(String),
}

impl CatalogId {
    /// Classify a raw identifier by its leading pattern.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if NUMERIC_ID.is_match(raw) {
            Some(Self::Pmid(raw.to_string()))
        } else if DOI_PREFIX.is_match(raw) {
            Some(Self::Doi(raw.to_string()))
        } else {
            None
        }
    }

    /// Whether a line looks like a catalog identifier.
    #[must_use]
    pub fn looks_like_id(raw: &str) -> bool {
        Self::parse(raw).is_some()
    }

    /// Bare identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Pmid(v) | Self::Doi(v) => v,
        }
    }
}

impl fmt::Display for CatalogId {
    /// Prefixed form used in catalog paths, e.g. `PMID:123` or `DOI:10.1/x`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pmid(v) => write!(f, "PMID:{v}"),
            Self::Doi(v) => write!(f, "DOI:{v}"),
        }
    }
}

/// Remote bibliographic catalog.
#[async_trait::async_trait]
pub trait ExternalCatalog: Send + Sync {
    /// Fetch the full record for one identifier.
    ///
    /// Returns `ClientError::NotFound` when the catalog has no such record.
    async fn fetch_by_id(&self, id: &CatalogId) -> ClientResult<PartialRecord>;

    /// Search the catalog, returning at most `limit` records.
    async fn search(&self, query: &str, limit: usize) -> ClientResult<Vec<PartialRecord>>;
}
