//! Compact JSON output formatting.

use serde_json::{Value, json};

use crate::models::{BatchImportJob, DuplicatePair, Record};

/// Create a compact record representation for JSON output.
///
/// Provenance metadata and empty fields are left out.
#[must_use]
pub fn compact_record(record: &Record) -> Value {
    let mut obj = json!({
        "id": record.id,
        "title": record.title,
    });

    if !record.authors.is_empty() {
        obj["authors"] = json!(record.authors);
    }

    if let Some(date) = &record.publication_date {
        obj["date"] = json!(date);
    }

    if let Some(journal) = &record.journal {
        obj["journal"] = json!(journal);
    }

    if let Some(doi) = &record.doi {
        obj["doi"] = json!(doi);
    }

    if let Some(external_id) = &record.external_id {
        obj["externalId"] = json!(external_id);
    }

    obj
}

/// Create a compact pair representation for JSON output.
#[must_use]
pub fn compact_pair(pair: &DuplicatePair) -> Value {
    json!({
        "matchType": pair.match_type,
        "similarity": pair.similarity,
        "status": pair.status,
        "a": compact_record(&pair.record_a),
        "b": compact_record(&pair.record_b),
    })
}

/// JSON report of a scan.
#[must_use]
pub fn pairs_report_json(pairs: &[DuplicatePair]) -> Value {
    json!({
        "total": pairs.len(),
        "pending": pairs.iter().filter(|p| p.is_pending()).count(),
        "pairs": pairs.iter().map(compact_pair).collect::<Vec<_>>(),
    })
}

/// JSON report of an import job, with its progress percentage.
#[must_use]
pub fn job_report_json(job: &BatchImportJob) -> Value {
    let mut obj = serde_json::to_value(job).unwrap_or_else(|_| json!({ "id": job.id }));
    obj["progressPercent"] = json!(job.progress_percent());
    obj["retryableErrors"] = json!(job.errors.iter().filter(|e| e.kind.is_retryable()).count());
    obj
}
