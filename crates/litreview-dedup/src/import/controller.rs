//! Batch import controller: one resumable background job at a time.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::job::ImportJob;
use super::source::ImportSource;
use super::worker::ImportWorker;
use crate::catalog::ExternalCatalog;
use crate::error::{JobError, JobResult};
use crate::models::{BatchImportJob, ImportOptions, JobStatus};
use crate::store::RecordStore;

/// Where a job gets its items from.
#[derive(Debug, Clone, PartialEq)]
pub enum JobSource {
    /// An already parsed file or id list.
    Parsed(ImportSource),
    /// Records returned by a catalog search, run when the job starts.
    CatalogSearch {
        /// Free-text query.
        query: String,
        /// Maximum number of records to import.
        limit: usize,
    },
}

impl From<ImportSource> for JobSource {
    fn from(source: ImportSource) -> Self {
        Self::Parsed(source)
    }
}

/// Control surface of the job currently owned by the controller.
struct JobControl {
    id: Uuid,
    progress: Arc<watch::Sender<BatchImportJob>>,
    pause: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl JobControl {
    fn is_active(&self) -> bool {
        !self.progress.borrow().status.is_terminal()
    }
}

/// Runs batch imports in the background and exposes pause, resume and cancel.
///
/// At most one job is active per controller. A finished job stays observable
/// through [`current`](Self::current) until the next one starts.
pub struct BatchImportController {
    store: Arc<dyn RecordStore>,
    catalog: Option<Arc<dyn ExternalCatalog>>,
    active: Mutex<Option<JobControl>>,
}

impl BatchImportController {
    /// Controller for tabular sources only.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, catalog: None, active: Mutex::new(None) }
    }

    /// Attach the catalog used to resolve identifiers and run searches.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn ExternalCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Start a job in the background and return its handle immediately.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        &self,
        source: impl Into<JobSource>,
        options: ImportOptions,
    ) -> JobResult<ImportJob> {
        let source = source.into();

        if options.chunk_size == 0 {
            return Err(JobError::invalid_options("chunk_size", "must be at least 1"));
        }
        if let JobSource::CatalogSearch { query, .. } = &source {
            if query.trim().is_empty() {
                return Err(JobError::invalid_options("query", "must not be empty"));
            }
        }

        let needs_catalog = matches!(
            source,
            JobSource::Parsed(ImportSource::IdList { .. }) | JobSource::CatalogSearch { .. }
        );
        if needs_catalog && self.catalog.is_none() {
            return Err(JobError::CatalogRequired);
        }

        let mut active = self.lock();
        if let Some(control) = active.as_ref().filter(|c| c.is_active()) {
            return Err(JobError::AlreadyRunning(control.id));
        }

        let id = Uuid::new_v4();
        let (progress, receiver) = watch::channel(BatchImportJob::queued(id));
        let progress = Arc::new(progress);
        let (pause, pause_rx) = watch::channel(false);
        let cancel = CancellationToken::new();

        let worker = ImportWorker {
            job_id: id,
            store: Arc::clone(&self.store),
            catalog: self.catalog.clone(),
            options,
            progress: Arc::clone(&progress),
            pause: pause_rx,
            cancel: cancel.clone(),
            search_query: None,
            fetched_any: false,
        };

        tracing::info!(job_id = %id, "Starting import job");
        tokio::spawn(worker.run(source));

        *active = Some(JobControl { id, progress, pause, cancel });
        Ok(ImportJob::new(id, receiver))
    }

    /// Suspend the active job at the next chunk boundary.
    pub fn pause(&self) -> JobResult<()> {
        self.with_active(|control| {
            control.pause.send_replace(true);
        })
    }

    /// Let a paused job continue with its next unprocessed chunk.
    pub fn resume(&self) -> JobResult<()> {
        self.with_active(|control| {
            control.pause.send_replace(false);
        })
    }

    /// Stop the active job before its next item. Already imported records are kept.
    pub fn cancel(&self) -> JobResult<()> {
        self.with_active(|control| control.cancel.cancel())
    }

    /// Snapshot of the most recent job, finished or not.
    #[must_use]
    pub fn current(&self) -> Option<BatchImportJob> {
        self.lock().as_ref().map(|control| control.progress.borrow().clone())
    }

    /// Status of the most recent job.
    #[must_use]
    pub fn status(&self) -> Option<JobStatus> {
        self.lock().as_ref().map(|control| control.progress.borrow().status)
    }

    fn with_active(&self, action: impl FnOnce(&JobControl)) -> JobResult<()> {
        let active = self.lock();
        match active.as_ref() {
            Some(control) if control.is_active() => {
                action(control);
                Ok(())
            }
            _ => Err(JobError::NoActiveJob),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JobControl>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BatchImportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchImportController")
            .field("has_catalog", &self.catalog.is_some())
            .field("status", &self.status())
            .finish()
    }
}
