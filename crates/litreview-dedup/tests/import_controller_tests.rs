//! Batch import controller tests against a scripted catalog and store.
//!
//! `#[tokio::test]` runs on a current-thread runtime, so the spawned job only
//! makes progress while the test is awaiting. The gated catalog uses that to
//! stop the job at exact points.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use litreview_dedup::catalog::{CatalogId, ExternalCatalog};
use litreview_dedup::error::{ClientError, ClientResult, JobError, StoreError, StoreResult};
use litreview_dedup::import::{self, DUPLICATE_DETECTED, ImportSource, JobSource, SourceHint};
use litreview_dedup::models::{ItemErrorKind, JobStatus, PartialRecord, Record, meta};
use litreview_dedup::store::{CandidateFilters, InMemoryStore, ProjectScope, RecordStore};
use litreview_dedup::{BatchImportController, ImportOptions};

// =============================================================================
// Test doubles
// =============================================================================

/// Catalog that knows every PMID except those listed as missing.
#[derive(Default)]
struct MockCatalog {
    missing: Vec<String>,
    failing: Vec<String>,
    search_results: Option<Vec<PartialRecord>>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl MockCatalog {
    fn gated(gate: Arc<Semaphore>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ExternalCatalog for MockCatalog {
    async fn fetch_by_id(&self, id: &CatalogId) -> ClientResult<PartialRecord> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.calls.lock().unwrap().push((id.value().to_string(), Instant::now()));

        if self.missing.iter().any(|m| m == id.value()) {
            return Err(ClientError::not_found(id.to_string()));
        }
        if self.failing.iter().any(|m| m == id.value()) {
            return Err(ClientError::server(503, "upstream down"));
        }

        let mut record = PartialRecord::titled(format!("Paper {}", id.value()));
        match id {
            CatalogId::Pmid(pmid) => record.external_id = Some(pmid.clone()),
            CatalogId::Doi(doi) => record.doi = Some(doi.clone()),
        }
        Ok(record)
    }

    async fn search(&self, query: &str, limit: usize) -> ClientResult<Vec<PartialRecord>> {
        match &self.search_results {
            Some(records) => Ok(records.iter().take(limit).cloned().collect()),
            None => Err(ClientError::bad_request(format!("bad query '{query}'"))),
        }
    }
}

/// Store that becomes unreachable after a number of inserts.
struct FlakyStore {
    inner: InMemoryStore,
    inserts_before_outage: Option<usize>,
    ping_fails: bool,
    lookups_fail: bool,
    inserts: Mutex<usize>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            inserts_before_outage: None,
            ping_fails: false,
            lookups_fail: false,
            inserts: Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for FlakyStore {
    async fn insert(&self, record: PartialRecord, project_id: Option<&str>) -> StoreResult<Record> {
        {
            let mut inserts = self.inserts.lock().unwrap();
            if self.inserts_before_outage.is_some_and(|limit| *inserts >= limit) {
                return Err(StoreError::unavailable("connection refused"));
            }
            *inserts += 1;
        }
        self.inner.insert(record, project_id).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.inner.delete(id).await
    }

    async fn find_candidate_duplicates(
        &self,
        record: &PartialRecord,
        filters: &CandidateFilters,
    ) -> StoreResult<Vec<Record>> {
        if self.lookups_fail {
            return Err(StoreError::unavailable("index offline"));
        }
        self.inner.find_candidate_duplicates(record, filters).await
    }

    async fn list_all(&self, scope: &ProjectScope) -> StoreResult<Vec<Record>> {
        self.inner.list_all(scope).await
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.ping_fails { Err(StoreError::unavailable("connection refused")) } else { Ok(()) }
    }
}

fn id_list(count: usize) -> ImportSource {
    ImportSource::IdList { ids: (1..=count).map(|i| (1000 + i).to_string()).collect() }
}

fn options(chunk_size: usize) -> ImportOptions {
    ImportOptions { chunk_size, fetch_delay: Duration::ZERO, ..ImportOptions::default() }
}

fn controller(store: &InMemoryStore, catalog: MockCatalog) -> BatchImportController {
    BatchImportController::new(Arc::new(store.clone())).with_catalog(Arc::new(catalog))
}

// =============================================================================
// Chunking and counters
// =============================================================================

#[tokio::test]
async fn test_twenty_five_ids_in_chunks_of_ten() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let job = controller.start(id_list(25), options(10)).unwrap();
    let report = job.wait().await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.total_items, 25);
    assert_eq!(report.total_chunks, 3);
    assert_eq!(report.completed_chunks, 3);
    assert_eq!(report.processed_items, 25);
    assert_eq!(report.successful_imports, 25);
    assert_eq!(report.failed_imports, 0);
    assert_eq!(report.progress_percent(), 100);
    assert!(report.completed_at.is_some());
    assert_eq!(store.len().await, 25);
}

#[tokio::test]
async fn test_counters_consistent_in_every_snapshot() {
    use tokio_stream::StreamExt;

    let store = InMemoryStore::new();
    let catalog = MockCatalog { missing: vec!["1003".into(), "1007".into()], ..MockCatalog::default() };
    let controller = controller(&store, catalog);

    let job = controller.start(id_list(10), options(3)).unwrap();
    let snapshots: Vec<_> = job.subscribe().take_while(|j| !j.status.is_terminal()).collect().await;

    for snapshot in snapshots.iter().chain(std::iter::once(&job.wait().await)) {
        assert_eq!(snapshot.processed_items, snapshot.successful_imports + snapshot.failed_imports);
        if snapshot.status != JobStatus::Queued {
            assert!(snapshot.processed_items <= snapshot.total_items);
        }
        assert!(snapshot.completed_chunks <= snapshot.total_chunks);
    }

    let report = job.snapshot();
    assert_eq!(report.successful_imports, 8);
    assert_eq!(report.failed_imports, 2);
    assert!(report.errors.iter().all(|e| e.kind == ItemErrorKind::NotFound));
}

#[tokio::test]
async fn test_empty_source_completes() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let report = controller
        .start(ImportSource::Tabular { records: vec![] }, options(10))
        .unwrap()
        .wait()
        .await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.total_chunks, 0);
    assert_eq!(report.progress_percent(), 100);
}

// =============================================================================
// Per-item failures
// =============================================================================

#[tokio::test]
async fn test_item_failures_do_not_stop_the_job() {
    let store = InMemoryStore::new();
    let catalog = MockCatalog {
        missing: vec!["1002".into()],
        failing: vec!["1003".into()],
        ..MockCatalog::default()
    };
    let controller = controller(&store, catalog);

    let source = ImportSource::IdList {
        ids: vec!["1001".into(), "1002".into(), "1003".into(), "not-an-id".into(), "1004".into()],
    };
    let report = controller.start(source, options(2)).unwrap().wait().await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.successful_imports, 2);
    assert_eq!(report.failed_imports, 3);

    let kinds: Vec<_> = report.errors.iter().map(|e| (e.item_ref.as_str(), e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("1002", ItemErrorKind::NotFound),
            ("1003", ItemErrorKind::FetchFailed),
            ("not-an-id", ItemErrorKind::InvalidIdentifier),
        ]
    );
}

#[tokio::test]
async fn test_existing_record_is_reported_as_duplicate() {
    let store = InMemoryStore::new();
    let mut existing = PartialRecord::titled("Something else entirely");
    existing.doi = Some("10.1000/ABC".into());
    store.insert(existing, None).await.unwrap();

    let controller = controller(&store, MockCatalog::default());
    let source = ImportSource::IdList { ids: vec!["10.1000/abc".into(), "1001".into()] };
    let report = controller.start(source, options(10)).unwrap().wait().await;

    assert_eq!(report.successful_imports, 1);
    assert_eq!(report.failed_imports, 1);
    assert_eq!(report.errors[0].item_ref, "10.1000/abc");
    assert_eq!(report.errors[0].kind, ItemErrorKind::DuplicateDetected);
    assert_eq!(report.errors[0].reason, DUPLICATE_DETECTED);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_duplicates_within_one_file() {
    let store = InMemoryStore::new();
    let controller = BatchImportController::new(Arc::new(store.clone()));

    let raw = "title,year\nDeep learning,2015\nDEEP LEARNING,2016\nSomething new,2020\n";
    let source = import::parse(raw, SourceHint::CSV).unwrap();
    let report = controller.start(source, options(50)).unwrap().wait().await;

    assert_eq!(report.successful_imports, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::DuplicateDetected);
}

#[tokio::test]
async fn test_duplicate_check_can_be_disabled() {
    let store = InMemoryStore::new();
    store.insert(PartialRecord::titled("Deep learning"), None).await.unwrap();
    let controller = BatchImportController::new(Arc::new(store.clone()));

    let source = ImportSource::Tabular { records: vec![PartialRecord::titled("Deep learning")] };
    let options = ImportOptions { check_duplicates: false, ..options(10) };
    let report = controller.start(source, options).unwrap().wait().await;

    assert_eq!(report.successful_imports, 1);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_duplicate_lookup_scoped_to_project() {
    let store = InMemoryStore::new();
    store.insert(PartialRecord::titled("Deep learning"), Some("other")).await.unwrap();
    let controller = BatchImportController::new(Arc::new(store.clone()));

    let source = ImportSource::Tabular { records: vec![PartialRecord::titled("Deep learning")] };
    let options = ImportOptions { project_id: Some("review".into()), ..options(10) };
    let report = controller.start(source, options).unwrap().wait().await;

    assert_eq!(report.successful_imports, 1);
    let in_project = store.list_all(&ProjectScope::Project("review".into())).await.unwrap();
    assert_eq!(in_project.len(), 1);
}

#[tokio::test]
async fn test_imported_records_carry_provenance() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let job = controller.start(id_list(1), options(10)).unwrap();
    job.wait().await;

    let records = store.list_all(&ProjectScope::All).await.unwrap();
    let metadata = &records[0].metadata;
    assert_eq!(metadata.get(meta::JOB_ID), Some(&job.id().to_string()));
    assert!(metadata.contains_key(meta::IMPORTED_AT));
    assert!(!metadata.contains_key(meta::SEARCH_QUERY));
}

// =============================================================================
// Pause, resume, cancel
// =============================================================================

#[tokio::test]
async fn test_pause_takes_effect_at_chunk_boundary() {
    let gate = Arc::new(Semaphore::new(10));
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::gated(gate.clone()));

    let job = controller.start(id_list(25), options(10)).unwrap();
    job.wait_for(|j| j.processed_items == 10).await;

    // The job is inside chunk two, blocked on its first fetch
    controller.pause().unwrap();
    gate.add_permits(10);

    let paused = job.wait_for(|j| j.status == JobStatus::Paused).await;
    assert_eq!(paused.processed_items, 20);
    assert_eq!(paused.completed_chunks, 2);

    // Nothing moves while paused
    gate.add_permits(5);
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(job.snapshot().processed_items, 20);
    assert_eq!(job.status(), JobStatus::Paused);

    controller.resume().unwrap();
    let report = job.wait().await;

    // Same outcome as an uninterrupted run
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.processed_items, 25);
    assert_eq!(report.successful_imports, 25);
    assert_eq!(store.len().await, 25);
}

#[tokio::test]
async fn test_pause_before_first_chunk() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let job = controller.start(id_list(5), options(2)).unwrap();
    controller.pause().unwrap();

    let paused = job.wait_for(|j| j.status == JobStatus::Paused).await;
    assert_eq!(paused.processed_items, 0);
    assert_eq!(paused.total_items, 5);

    controller.resume().unwrap();
    assert_eq!(job.wait().await.successful_imports, 5);
}

#[tokio::test]
async fn test_cancel_before_worker_runs() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let job = controller.start(id_list(5), options(2)).unwrap();
    controller.cancel().unwrap();

    let report = job.wait().await;
    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.processed_items, 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_cancel_mid_run_keeps_imported_records() {
    let gate = Arc::new(Semaphore::new(3));
    let store = InMemoryStore::new();
    let catalog = Arc::new(MockCatalog::gated(gate.clone()));
    let controller =
        BatchImportController::new(Arc::new(store.clone())).with_catalog(catalog.clone());

    let job = controller.start(id_list(10), options(5)).unwrap();
    job.wait_for(|j| j.processed_items == 3).await;

    controller.cancel().unwrap();
    gate.add_permits(100);

    let report = job.wait().await;

    // The fetch already in flight completes, nothing after it starts
    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.processed_items, 4);
    assert_eq!(catalog.calls().len(), 4);
    assert_eq!(store.len().await, 4);
    assert!(matches!(controller.cancel(), Err(JobError::NoActiveJob)));
}

#[tokio::test]
async fn test_cancel_while_paused() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let job = controller.start(id_list(5), options(2)).unwrap();
    controller.pause().unwrap();
    job.wait_for(|j| j.status == JobStatus::Paused).await;

    controller.cancel().unwrap();
    let report = job.wait().await;
    assert_eq!(report.status, JobStatus::Cancelled);
    assert_eq!(report.processed_items, 0);
}

#[tokio::test]
async fn test_fetch_delay_between_requests() {
    let store = InMemoryStore::new();
    let catalog = Arc::new(MockCatalog::default());
    let controller =
        BatchImportController::new(Arc::new(store.clone())).with_catalog(catalog.clone());

    let delay = Duration::from_millis(40);
    let options = ImportOptions { fetch_delay: delay, ..options(2) };
    let started = Instant::now();
    controller.start(id_list(4), options).unwrap().wait().await;

    // No delay before the first fetch, one before each of the others
    assert!(started.elapsed() >= delay * 3);
    let calls = catalog.calls();
    assert_eq!(calls.len(), 4);
    for window in calls.windows(2) {
        assert!(window[1].1.duration_since(window[0].1) >= delay);
    }
}

// =============================================================================
// Whole-job faults and controller errors
// =============================================================================

#[tokio::test]
async fn test_store_outage_fails_the_job() {
    let store = FlakyStore { inserts_before_outage: Some(3), ..FlakyStore::new() };
    let controller = BatchImportController::new(Arc::new(store))
        .with_catalog(Arc::new(MockCatalog::default()));

    let report = controller.start(id_list(10), options(4)).unwrap().wait().await;

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.successful_imports, 3);
    assert_eq!(report.failed_imports, 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::InsertFailed);
    assert!(report.failure.as_deref().is_some_and(|f| f.contains("outage")));
}

#[tokio::test]
async fn test_failed_duplicate_lookup_is_not_an_insert_failure() {
    let store = FlakyStore { lookups_fail: true, ..FlakyStore::new() };
    let controller = BatchImportController::new(Arc::new(store))
        .with_catalog(Arc::new(MockCatalog::default()));

    let report = controller.start(id_list(3), options(4)).unwrap().wait().await;

    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.successful_imports, 0);
    assert_eq!(report.failed_imports, 1);
    assert_eq!(report.errors[0].kind, ItemErrorKind::LookupFailed);
    assert!(report.errors[0].reason.starts_with("duplicate lookup failed"));
}

#[tokio::test]
async fn test_unreachable_store_fails_before_processing() {
    let store = FlakyStore { ping_fails: true, ..FlakyStore::new() };
    let controller = BatchImportController::new(Arc::new(store))
        .with_catalog(Arc::new(MockCatalog::default()));

    let report = controller.start(id_list(3), options(4)).unwrap().wait().await;
    assert_eq!(report.status, JobStatus::Failed);
    assert_eq!(report.processed_items, 0);
}

#[tokio::test]
async fn test_catalog_search_source() {
    let store = InMemoryStore::new();
    let catalog = MockCatalog {
        search_results: Some(vec![
            PartialRecord::titled("First hit"),
            PartialRecord::titled("Second hit"),
            PartialRecord::titled("Third hit"),
        ]),
        ..MockCatalog::default()
    };
    let controller = controller(&store, catalog);

    let source = JobSource::CatalogSearch { query: "sepsis".into(), limit: 2 };
    let report = controller.start(source, options(10)).unwrap().wait().await;

    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.successful_imports, 2);

    let records = store.list_all(&ProjectScope::All).await.unwrap();
    assert!(
        records
            .iter()
            .all(|r| r.metadata.get(meta::SEARCH_QUERY).map(String::as_str) == Some("sepsis"))
    );
}

#[tokio::test]
async fn test_catalog_search_failure_fails_the_job() {
    let store = InMemoryStore::new();
    let controller = controller(&store, MockCatalog::default());

    let source = JobSource::CatalogSearch { query: "sepsis".into(), limit: 5 };
    let report = controller.start(source, options(10)).unwrap().wait().await;

    assert_eq!(report.status, JobStatus::Failed);
    assert!(report.failure.is_some());
}

#[tokio::test]
async fn test_controller_errors() {
    let store = InMemoryStore::new();
    let without_catalog = BatchImportController::new(Arc::new(store.clone()));

    let err = without_catalog
        .start(JobSource::CatalogSearch { query: "x".into(), limit: 1 }, options(10))
        .unwrap_err();
    assert!(matches!(err, JobError::CatalogRequired));

    let controller = controller(&store, MockCatalog::default());
    let err = controller
        .start(JobSource::CatalogSearch { query: "  ".into(), limit: 1 }, options(10))
        .unwrap_err();
    assert!(matches!(err, JobError::InvalidOptions { .. }));

    let job = controller.start(id_list(2), options(10)).unwrap();
    assert!(matches!(
        controller.start(id_list(2), options(10)),
        Err(JobError::AlreadyRunning(id)) if id == job.id()
    ));

    job.wait().await;
    assert_eq!(controller.current().map(|j| j.status), Some(JobStatus::Completed));
    assert!(matches!(controller.pause(), Err(JobError::NoActiveJob)));
}
