//! Markdown output formatting.

use crate::models::{BatchImportJob, DuplicatePair, PairStatus, Record};

/// Format the pairs of a scan as Markdown, one section per pair.
#[must_use]
pub fn format_pairs_markdown(pairs: &[DuplicatePair]) -> String {
    if pairs.is_empty() {
        return "No duplicates found.".to_string();
    }

    let pending = pairs.iter().filter(|p| p.is_pending()).count();
    let mut output =
        format!("# Duplicate candidates ({} pairs, {} pending)\n\n", pairs.len(), pending);

    for (i, pair) in pairs.iter().enumerate() {
        output.push_str(&format_pair_markdown(pair, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single pair as Markdown.
#[must_use]
pub fn format_pair_markdown(pair: &DuplicatePair, index: usize) -> String {
    let status = match pair.status {
        PairStatus::Pending => "pending",
        PairStatus::Merged => "merged",
        PairStatus::NotDuplicate => "not a duplicate",
    };

    let mut output = format!(
        "## {}. {} ({}%) | {}\n\n",
        index,
        pair.match_type.as_str(),
        pair.similarity,
        status
    );

    output.push_str(&format_record_line("A", &pair.record_a));
    output.push_str(&format_record_line("B", &pair.record_b));
    output
}

fn format_record_line(label: &str, record: &Record) -> String {
    let mut meta = Vec::new();
    if !record.authors.is_empty() {
        meta.push(record.authors.join(", "));
    }
    if let Some(date) = &record.publication_date {
        meta.push(date.clone());
    }
    if let Some(doi) = &record.doi {
        meta.push(format!("[DOI](https://doi.org/{doi})"));
    }

    let mut line = format!("- **{label}** `{}`: {}", record.id, record.title);
    if !meta.is_empty() {
        line.push_str(&format!(" ({})", meta.join(" | ")));
    }
    line.push('\n');
    line
}

/// Format an import job report as Markdown.
#[must_use]
pub fn format_job_markdown(job: &BatchImportJob) -> String {
    let mut output = format!("# Import job {}\n\n", job.id);

    output.push_str(&format!(
        "**Status**: {:?} | **Progress**: {}% ({}/{} items, {}/{} chunks)\n\n",
        job.status,
        job.progress_percent(),
        job.processed_items,
        job.total_items,
        job.completed_chunks,
        job.total_chunks
    ));

    output.push_str(&format!(
        "**Imported**: {} | **Failed**: {}\n\n",
        job.successful_imports, job.failed_imports
    ));

    if let Some(failure) = &job.failure {
        output.push_str(&format!("> **Job failed**: {failure}\n\n"));
    }

    if !job.errors.is_empty() {
        output.push_str("## Errors\n\n");
        output.push_str(
            "| Item | Kind | Reason | Retryable |\n|------|------|--------|-----------|\n",
        );
        for error in &job.errors {
            output.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&error.item_ref),
                error.kind.as_str(),
                escape_cell(&error.reason),
                if error.kind.is_retryable() { "yes" } else { "no" }
            ));
        }
    }

    output
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
