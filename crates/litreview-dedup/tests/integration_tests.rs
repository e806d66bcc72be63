//! Integration tests against the live Semantic Scholar API.
//!
//! Run with: `cargo test --features integration -- --nocapture`

#![cfg(feature = "integration")]

use std::sync::Arc;

use litreview_dedup::catalog::{CatalogId, ExternalCatalog};
use litreview_dedup::client::SemanticScholarClient;
use litreview_dedup::config::Config;
use litreview_dedup::import::{ImportSource, JobSource};
use litreview_dedup::models::JobStatus;
use litreview_dedup::store::InMemoryStore;
use litreview_dedup::{BatchImportController, ImportOptions};

/// Well-known identifiers for testing.
mod ids {
    /// "Attention Is All You Need" - Vaswani et al. 2017
    pub const ATTENTION_DOI: &str = "10.48550/arXiv.1706.03762";
    /// Surviving Sepsis Campaign guidelines 2016
    pub const SEPSIS_PMID: &str = "28101605";
}

fn create_client() -> Arc<SemanticScholarClient> {
    let config = Config::from_env().expect("valid environment");
    Arc::new(SemanticScholarClient::new(config).expect("Failed to create client"))
}

#[tokio::test]
async fn test_fetch_real_doi() {
    let client = create_client();
    let record = client.fetch_by_id(&CatalogId::Doi(ids::ATTENTION_DOI.into())).await.unwrap();

    println!("Fetched: {}", record.title);
    assert!(record.title.to_lowercase().contains("attention"));
}

#[tokio::test]
async fn test_search_real() {
    let client = create_client();
    let records = client.search("systematic review deduplication", 5).await.unwrap();

    println!("Found {} records", records.len());
    assert!(records.len() <= 5);
}

#[tokio::test]
async fn test_import_real_ids() {
    let store = InMemoryStore::new();
    let controller = BatchImportController::new(Arc::new(store.clone())).with_catalog(create_client());

    let source = ImportSource::IdList {
        ids: vec![ids::SEPSIS_PMID.into(), ids::ATTENTION_DOI.into(), ids::SEPSIS_PMID.into()],
    };
    let report = controller
        .start(JobSource::from(source), ImportOptions::default())
        .unwrap()
        .wait()
        .await;

    println!("{report:#?}");
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.processed_items, 3);
    // The repeated id is suppressed as a duplicate
    assert!(report.failed_imports >= 1);
}
