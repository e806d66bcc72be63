//! Import source parsing: identifier lists and tabular files.

use std::path::Path;

use crate::catalog::CatalogId;
use crate::error::{ImportError, ImportResult};
use crate::models::{PartialRecord, RecordSource, meta, non_empty};

/// A parsed, validated import source.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    /// Catalog identifiers (PMIDs or DOIs), one per item, in input order.
    IdList {
        /// Trimmed, non-empty lines.
        ids: Vec<String>,
    },
    /// Records read from a tabular file.
    Tabular {
        /// Rows that had a title.
        records: Vec<PartialRecord>,
    },
}

impl ImportSource {
    /// Number of items a job will process.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::IdList { ids } => ids.len(),
            Self::Tabular { records } => records.len(),
        }
    }

    /// Whether there is nothing to import.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IdList { .. } => "id-list",
            Self::Tabular { .. } => "tabular",
        }
    }
}

/// How the raw input should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHint {
    /// One identifier per line.
    PlainText,
    /// Delimited text with a header row.
    Tabular {
        /// Field delimiter.
        delimiter: u8,
    },
}

impl SourceHint {
    /// Comma separated values.
    pub const CSV: Self = Self::Tabular { delimiter: b',' };

    /// Tab separated values.
    pub const TSV: Self = Self::Tabular { delimiter: b'\t' };

    /// Guess from a file extension: `.csv` and `.tsv` are tabular, anything else plain text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Self::CSV,
            Some("tsv" | "tab") => Self::TSV,
            _ => Self::PlainText,
        }
    }
}

/// Field a header column maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Title,
    Authors,
    Journal,
    PublicationDate,
    Doi,
    Pmid,
    Abstract,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
        match normalized.as_str() {
            "title" => Some(Self::Title),
            "authors" | "author" => Some(Self::Authors),
            "journal" => Some(Self::Journal),
            "year" | "publication_year" | "date" | "publication_date" => {
                Some(Self::PublicationDate)
            }
            "doi" => Some(Self::Doi),
            "pmid" => Some(Self::Pmid),
            "abstract" => Some(Self::Abstract),
            _ => None,
        }
    }
}

/// Parse raw input into an [`ImportSource`].
///
/// Plain text is an id list when its first non-empty line is a numeric id or
/// starts with a DOI prefix; anything else is [`ImportError::UnrecognizedFormat`].
/// Tabular input maps known headers to record fields, ignores the rest, and
/// drops rows without a title.
pub fn parse(raw: &str, hint: SourceHint) -> ImportResult<ImportSource> {
    match hint {
        SourceHint::PlainText => parse_id_list(raw),
        SourceHint::Tabular { delimiter } => parse_tabular(raw, delimiter),
    }
}

/// Read a file and parse it with the hint derived from its extension.
pub async fn parse_file(path: impl AsRef<Path>) -> ImportResult<ImportSource> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    parse(&raw, SourceHint::from_path(path))
}

fn parse_id_list(raw: &str) -> ImportResult<ImportSource> {
    let ids: Vec<String> =
        raw.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();

    let Some(first) = ids.first() else {
        return Err(ImportError::unrecognized("input is empty"));
    };

    if !CatalogId::looks_like_id(first) {
        return Err(ImportError::unrecognized(format!(
            "first line '{}' is neither a numeric catalog id nor a DOI",
            truncate(first, 60)
        )));
    }

    Ok(ImportSource::IdList { ids })
}

fn parse_tabular(raw: &str, delimiter: u8) -> ImportResult<ImportSource> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers.iter().map(Column::from_header).collect();

    if !columns.contains(&Some(Column::Title)) {
        return Err(ImportError::MissingTitleColumn {
            headers: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut records = Vec::new();

    for (row_index, row) in reader.records().enumerate() {
        let row = row?;
        let mut record = PartialRecord { source: RecordSource::FileImport, ..PartialRecord::default() };
        let mut pmid = None;

        for (value, column) in row.iter().zip(&columns) {
            let Some(column) = column else { continue };
            let Some(value) = non_empty(Some(value)) else { continue };

            // First non-empty column wins when several map to the same field
            match column {
                Column::Title if record.title.is_empty() => record.title = value.to_string(),
                Column::Authors if record.authors.is_empty() => record.authors = split_authors(value),
                Column::Journal => fill(&mut record.journal, value),
                Column::PublicationDate => fill(&mut record.publication_date, value),
                Column::Doi => fill(&mut record.doi, value),
                Column::Pmid => fill(&mut pmid, value),
                Column::Abstract => fill(&mut record.r#abstract, value),
                Column::Title | Column::Authors => {}
            }
        }

        if record.title.is_empty() {
            tracing::debug!(row = row_index + 1, "Dropping row without title");
            continue;
        }

        record.external_id = Some(
            record.doi.clone().or(pmid).unwrap_or_else(|| format!("row-{}", row_index + 1)),
        );
        record.metadata.insert(meta::SOURCE.to_string(), RecordSource::FileImport.as_str().to_string());
        records.push(record);
    }

    Ok(ImportSource::Tabular { records })
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn split_authors(value: &str) -> Vec<String> {
    value.split(';').map(str::trim).filter(|a| !a.is_empty()).map(str::to_string).collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
