//! The task that actually runs an import job.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::controller::JobSource;
use super::source::ImportSource;
use crate::catalog::{CatalogId, ExternalCatalog};
use crate::dedup::classify_exact;
use crate::error::StoreError;
use crate::models::{
    BatchImportJob, ImportOptions, ItemError, ItemErrorKind, JobStatus, PartialRecord, meta,
};
use crate::store::{CandidateFilters, ProjectScope, RecordStore};

/// Reason recorded for items suppressed as duplicates.
pub const DUPLICATE_DETECTED: &str = "duplicate-detected";

/// One unit of work.
enum ImportItem {
    /// Catalog identifier still to be fetched.
    Identifier(String),
    /// Record ready to insert.
    Record(PartialRecord),
}

/// What the job loop does after an item.
enum Flow {
    Continue,
    Cancelled,
    Fatal(String),
}

pub(super) struct ImportWorker {
    pub(super) job_id: Uuid,
    pub(super) store: Arc<dyn RecordStore>,
    pub(super) catalog: Option<Arc<dyn ExternalCatalog>>,
    pub(super) options: ImportOptions,
    pub(super) progress: Arc<watch::Sender<BatchImportJob>>,
    pub(super) pause: watch::Receiver<bool>,
    pub(super) cancel: CancellationToken,
    pub(super) search_query: Option<String>,
    pub(super) fetched_any: bool,
}

impl ImportWorker {
    pub(super) async fn run(mut self, source: JobSource) {
        if self.cancel.is_cancelled() {
            self.finish(JobStatus::Cancelled);
            return;
        }

        if let Err(e) = self.store.ping().await {
            self.fail(format!("record store unreachable: {e}"));
            return;
        }

        let items = match self.read_source(source).await {
            Ok(items) => items,
            Err(reason) => {
                self.fail(reason);
                return;
            }
        };

        let chunk_size = self.options.chunk_size;
        let total_items = items.len();
        let total_chunks = total_items.div_ceil(chunk_size);

        self.update(|job| {
            job.status = JobStatus::Processing;
            job.total_items = total_items;
            job.total_chunks = total_chunks;
        });
        tracing::info!(job_id = %self.job_id, total_items, total_chunks, "Import job processing");

        let mut remaining = items.into_iter();
        loop {
            let chunk: Vec<ImportItem> = remaining.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }

            if self.cancel.is_cancelled() || !self.wait_while_paused().await {
                self.finish(JobStatus::Cancelled);
                return;
            }

            for item in chunk {
                if self.cancel.is_cancelled() {
                    self.finish(JobStatus::Cancelled);
                    return;
                }

                match self.process_item(item).await {
                    Flow::Continue => {}
                    Flow::Cancelled => {
                        self.finish(JobStatus::Cancelled);
                        return;
                    }
                    Flow::Fatal(reason) => {
                        self.fail(reason);
                        return;
                    }
                }
            }

            self.update(|job| job.completed_chunks += 1);
        }

        self.finish(JobStatus::Completed);
    }

    /// Turn the job source into items. An error here fails the whole job.
    async fn read_source(&mut self, source: JobSource) -> Result<Vec<ImportItem>, String> {
        match source {
            JobSource::Parsed(ImportSource::IdList { ids }) => {
                Ok(ids.into_iter().map(ImportItem::Identifier).collect())
            }
            JobSource::Parsed(ImportSource::Tabular { records }) => {
                Ok(records.into_iter().map(ImportItem::Record).collect())
            }
            JobSource::CatalogSearch { query, limit } => {
                let catalog = self.catalog.as_ref().ok_or("no external catalog configured")?;
                let records = catalog
                    .search(&query, limit)
                    .await
                    .map_err(|e| format!("catalog search '{query}' failed: {e}"))?;
                self.search_query = Some(query);
                Ok(records.into_iter().map(ImportItem::Record).collect())
            }
        }
    }

    /// Block while the pause flag is set. Returns false if cancelled meanwhile.
    async fn wait_while_paused(&mut self) -> bool {
        if !*self.pause.borrow() {
            return true;
        }

        self.update(|job| job.status = JobStatus::Paused);
        tracing::info!(job_id = %self.job_id, "Import job paused");

        let resumed = tokio::select! {
            () = self.cancel.cancelled() => false,
            changed = self.pause.wait_for(|paused| !*paused) => changed.is_ok(),
        };

        if !resumed || self.cancel.is_cancelled() {
            return false;
        }

        self.update(|job| job.status = JobStatus::Processing);
        tracing::info!(job_id = %self.job_id, "Import job resumed");
        true
    }

    async fn process_item(&mut self, item: ImportItem) -> Flow {
        let (item_ref, record) = match item {
            ImportItem::Identifier(raw) => {
                let Some(id) = CatalogId::parse(&raw) else {
                    self.item_failed(raw, ItemErrorKind::InvalidIdentifier, "not a catalog id or DOI");
                    return Flow::Continue;
                };

                match self.fetch(&id).await {
                    Some(Ok(record)) => (raw, record),
                    Some(Err((kind, reason))) => {
                        self.item_failed(raw, kind, reason);
                        return Flow::Continue;
                    }
                    None => return Flow::Cancelled,
                }
            }
            ImportItem::Record(record) => {
                let item_ref = record.external_id.clone().unwrap_or_else(|| record.title.clone());
                (item_ref, record)
            }
        };

        let record = self.stamp(record);

        if self.options.check_duplicates {
            match self.find_duplicate(&record).await {
                Ok(Some(existing_id)) => {
                    tracing::debug!(job_id = %self.job_id, item = %item_ref, existing = %existing_id, "Duplicate suppressed");
                    self.item_failed(item_ref, ItemErrorKind::DuplicateDetected, DUPLICATE_DETECTED);
                    return Flow::Continue;
                }
                Ok(None) => {}
                Err(e) => {
                    return self.store_failed(
                        item_ref,
                        ItemErrorKind::LookupFailed,
                        "duplicate lookup failed",
                        &e,
                    );
                }
            }
        }

        match self.store.insert(record, self.options.project_id.as_deref()).await {
            Ok(_) => {
                self.update(BatchImportJob::record_success);
                Flow::Continue
            }
            Err(e) => self.store_failed(item_ref, ItemErrorKind::InsertFailed, "insert failed", &e),
        }
    }

    /// Fetch one record, honoring the delay between consecutive requests.
    ///
    /// Returns `None` if the job was cancelled during the delay.
    async fn fetch(
        &mut self,
        id: &CatalogId,
    ) -> Option<Result<PartialRecord, (ItemErrorKind, String)>> {
        let Some(catalog) = self.catalog.clone() else {
            return Some(Err((ItemErrorKind::FetchFailed, "no external catalog configured".into())));
        };

        let delay = self.options.fetch_delay;
        if self.fetched_any && !delay.is_zero() {
            tokio::select! {
                () = self.cancel.cancelled() => return None,
                () = tokio::time::sleep(delay) => {}
            }
        }
        self.fetched_any = true;

        // An in-flight request always completes; cancellation is checked before the next item
        Some(catalog.fetch_by_id(id).await.map_err(|e| {
            let kind =
                if e.is_not_found() { ItemErrorKind::NotFound } else { ItemErrorKind::FetchFailed };
            (kind, e.to_string())
        }))
    }

    /// Id of an existing record equivalent by DOI or exact title, if any.
    async fn find_duplicate(&self, record: &PartialRecord) -> Result<Option<String>, StoreError> {
        let scope = ProjectScope::from_project(self.options.project_id.as_deref());
        let candidates =
            self.store.find_candidate_duplicates(record, &CandidateFilters::in_scope(scope)).await?;

        Ok(candidates
            .into_iter()
            .find(|existing| classify_exact(record, existing).is_some())
            .map(|existing| existing.id))
    }

    fn stamp(&self, mut record: PartialRecord) -> PartialRecord {
        let metadata = &mut record.metadata;
        metadata.insert(meta::SOURCE.to_string(), record.source.as_str().to_string());
        metadata.insert(meta::IMPORTED_AT.to_string(), Utc::now().to_rfc3339());
        metadata.insert(meta::JOB_ID.to_string(), self.job_id.to_string());
        if let Some(query) = &self.search_query {
            metadata.insert(meta::SEARCH_QUERY.to_string(), query.clone());
        }
        record
    }

    /// Record a store failure on the item; a fatal one also fails the job.
    fn store_failed(
        &self,
        item_ref: String,
        kind: ItemErrorKind,
        context: &str,
        error: &StoreError,
    ) -> Flow {
        let reason = format!("{context}: {error}");
        self.item_failed(item_ref, kind, reason.clone());

        if error.is_fatal() { Flow::Fatal(format!("record store outage: {reason}")) } else { Flow::Continue }
    }

    fn item_failed(&self, item_ref: String, kind: ItemErrorKind, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(job_id = %self.job_id, item = %item_ref, ?kind, %reason, "Import item failed");
        self.update(|job| job.record_failure(ItemError { item_ref, kind, reason }));
    }

    fn fail(&self, reason: String) {
        tracing::error!(job_id = %self.job_id, %reason, "Import job failed");
        self.update(|job| {
            job.failure = Some(reason);
            job.finish(JobStatus::Failed);
        });
    }

    fn finish(&self, status: JobStatus) {
        self.update(|job| job.finish(status));

        let job = self.progress.borrow();
        tracing::info!(
            job_id = %self.job_id,
            status = ?job.status,
            processed = job.processed_items,
            successful = job.successful_imports,
            failed = job.failed_imports,
            "Import job finished"
        );
    }

    /// Apply a change unless the job is already terminal.
    fn update(&self, change: impl FnOnce(&mut BatchImportJob)) {
        self.progress.send_modify(|job| {
            if !job.status.is_terminal() {
                change(job);
            }
        });
    }
}
