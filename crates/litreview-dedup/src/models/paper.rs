//! Paper data model matching the catalog Graph API schema.

use serde::{Deserialize, Serialize};

use super::{PartialRecord, RecordSource};

/// A paper as returned by the external catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    /// Catalog paper ID.
    pub paper_id: String,

    /// Paper title.
    #[serde(default)]
    pub title: Option<String>,

    /// Paper abstract.
    #[serde(default)]
    pub r#abstract: Option<String>,

    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,

    /// List of authors.
    #[serde(default)]
    pub authors: Vec<AuthorRef>,

    /// Publication venue (journal or conference).
    #[serde(default)]
    pub venue: Option<String>,

    /// Journal details, when the venue is a journal.
    #[serde(default)]
    pub journal: Option<Journal>,

    /// Publication date in ISO format (YYYY-MM-DD).
    #[serde(default)]
    pub publication_date: Option<String>,

    /// External identifiers (DOI, PubMed, etc.).
    #[serde(default)]
    pub external_ids: Option<ExternalIds>,
}

impl Paper {
    /// Get the DOI if available.
    #[must_use]
    pub fn doi(&self) -> Option<&str> {
        self.external_ids.as_ref()?.doi.as_deref()
    }

    /// Get the PubMed ID if available.
    #[must_use]
    pub fn pmid(&self) -> Option<&str> {
        self.external_ids.as_ref()?.pubmed.as_deref()
    }

    /// Convert into an importable record.
    ///
    /// The external id prefers the PubMed id, falling back to the catalog id.
    /// Returns `None` for papers without a title, which cannot be imported.
    #[must_use]
    pub fn into_partial_record(self) -> Option<PartialRecord> {
        let title = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?.to_string();

        let journal = self
            .journal
            .as_ref()
            .and_then(|j| j.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| self.venue.clone().filter(|v| !v.is_empty()));

        let publication_date =
            self.publication_date.clone().or_else(|| self.year.map(|y| y.to_string()));

        let external_id = self.pmid().map(str::to_string).or_else(|| Some(self.paper_id.clone()));

        Some(PartialRecord {
            title,
            authors: self.authors.into_iter().filter_map(|a| a.name).collect(),
            journal,
            publication_date,
            doi: self.external_ids.as_ref().and_then(|ids| ids.doi.clone()),
            external_id,
            r#abstract: self.r#abstract,
            source: RecordSource::ExternalCatalog,
            metadata: std::collections::BTreeMap::new(),
        })
    }
}

/// Author reference embedded in a paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    /// Catalog author ID.
    #[serde(default)]
    pub author_id: Option<String>,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Journal details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Journal {
    /// Journal name.
    #[serde(default)]
    pub name: Option<String>,

    /// Volume.
    #[serde(default)]
    pub volume: Option<String>,

    /// Page range.
    #[serde(default)]
    pub pages: Option<String>,
}

/// External identifiers for a paper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    /// Digital Object Identifier.
    #[serde(rename = "DOI")]
    pub doi: Option<String>,

    /// PubMed ID.
    #[serde(rename = "PubMed")]
    pub pubmed: Option<String>,

    /// PubMed Central ID.
    #[serde(rename = "PubMedCentral")]
    pub pmc: Option<String>,

    /// ArXiv preprint ID.
    #[serde(rename = "ArXiv")]
    pub arxiv: Option<String>,
}

/// Search result wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// Total number of matching papers.
    #[serde(default)]
    pub total: i64,

    /// Current offset in the result set.
    #[serde(default)]
    pub offset: i32,

    /// Indicates if more results are available.
    #[serde(default)]
    pub next: Option<i32>,

    /// List of papers in this page.
    #[serde(default)]
    pub data: Vec<Paper>,
}

impl SearchResult {
    /// Check if there are more results available.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next.is_some()
    }
}
