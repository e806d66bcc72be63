//! Bibliographic record model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata keys stamped on imported records.
pub mod meta {
    /// How the record entered the store (`manual`, `external-catalog`, `file-import`).
    pub const SOURCE: &str = "source";
    /// RFC 3339 timestamp of the import.
    pub const IMPORTED_AT: &str = "importedAt";
    /// Id of the import job that created the record.
    pub const JOB_ID: &str = "jobId";
    /// Catalog query the record was found with.
    pub const SEARCH_QUERY: &str = "searchQuery";
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordSource {
    /// Entered by hand.
    #[default]
    Manual,
    /// Fetched from the external catalog.
    ExternalCatalog,
    /// Read from an uploaded file.
    FileImport,
}

impl RecordSource {
    /// Wire name, as stored in record metadata.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::ExternalCatalog => "external-catalog",
            Self::FileImport => "file-import",
        }
    }
}

/// A persisted bibliographic entry, owned by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned id.
    pub id: String,

    /// Project the record belongs to.
    #[serde(default)]
    pub project_id: Option<String>,

    /// Title.
    pub title: String,

    /// Author names in display order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Journal or venue.
    #[serde(default)]
    pub journal: Option<String>,

    /// Publication date as provided by the source (year or full date).
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Digital Object Identifier.
    #[serde(default)]
    pub doi: Option<String>,

    /// Source-specific identifier (PMID or catalog id).
    #[serde(default, alias = "pmid")]
    pub external_id: Option<String>,

    /// Abstract.
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Origin of the record.
    #[serde(default)]
    pub source: RecordSource,

    /// Provenance: import timestamp, job id, search query.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Record {
    /// Number of non-empty fields among DOI, abstract and external id.
    ///
    /// Used to decide which side of an exact duplicate pair is kept.
    #[must_use]
    pub fn completeness(&self) -> usize {
        [&self.doi, &self.r#abstract, &self.external_id]
            .into_iter()
            .filter(|field| non_empty(field.as_deref()).is_some())
            .count()
    }
}

/// A record that has not been persisted yet.
///
/// Produced by import sources and the external catalog; the store turns it
/// into a [`Record`] on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRecord {
    /// Title.
    pub title: String,

    /// Author names in display order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Journal or venue.
    #[serde(default)]
    pub journal: Option<String>,

    /// Publication date as provided by the source.
    #[serde(default)]
    pub publication_date: Option<String>,

    /// Digital Object Identifier.
    #[serde(default)]
    pub doi: Option<String>,

    /// Source-specific identifier.
    #[serde(default)]
    pub external_id: Option<String>,

    /// Abstract.
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Origin of the record.
    #[serde(default)]
    pub source: RecordSource,

    /// Provenance metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PartialRecord {
    /// Create a record with just a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    /// Turn into a persisted record with the given id and project.
    #[must_use]
    pub fn into_record(self, id: String, project_id: Option<String>) -> Record {
        Record {
            id,
            project_id,
            title: self.title,
            authors: self.authors,
            journal: self.journal,
            publication_date: self.publication_date,
            doi: self.doi,
            external_id: self.external_id,
            r#abstract: self.r#abstract,
            source: self.source,
            metadata: self.metadata,
        }
    }
}

/// Read access to the fields duplicate classification looks at.
///
/// Implemented by both persisted and not-yet-persisted records so the same
/// classifier serves full-corpus scans and import-time suppression.
pub trait Bibliographic {
    /// Record title.
    fn title(&self) -> &str;

    /// Author names.
    fn authors(&self) -> &[String];

    /// Publication date as provided.
    fn publication_date(&self) -> Option<&str>;

    /// DOI, if present and non-blank.
    fn doi(&self) -> Option<&str>;
}

impl Bibliographic for Record {
    fn title(&self) -> &str {
        &self.title
    }

    fn authors(&self) -> &[String] {
        &self.authors
    }

    fn publication_date(&self) -> Option<&str> {
        self.publication_date.as_deref()
    }

    fn doi(&self) -> Option<&str> {
        non_empty(self.doi.as_deref())
    }
}

impl Bibliographic for PartialRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn authors(&self) -> &[String] {
        &self.authors
    }

    fn publication_date(&self) -> Option<&str> {
        self.publication_date.as_deref()
    }

    fn doi(&self) -> Option<&str> {
        non_empty(self.doi.as_deref())
    }
}

/// Trim a field and treat blank as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
