//! Literature Review Deduplication
//!
//! Duplicate detection, merge resolution and resumable batch import for the
//! bibliographic records of a literature review.
//!
//! # Features
//!
//! - **Tiered detection**: DOI, exact title, fuzzy title, author/year similarity
//! - **Merge resolution**: keep one side, mark as distinct, or auto-merge exact pairs
//! - **Batch import**: id lists, CSV/TSV files and catalog searches, chunked, pausable, cancellable
//! - **Rate-limited catalog**: Semantic Scholar client with retry, cache and a shared request ceiling
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use litreview_dedup::{
//!     BatchImportController, Config, ImportOptions, InMemoryStore, SemanticScholarClient,
//!     import::{self, SourceHint},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let options = ImportOptions::from_config(&config);
//!     let client = SemanticScholarClient::new(config)?;
//!
//!     let store = Arc::new(InMemoryStore::new());
//!     let controller = BatchImportController::new(store).with_catalog(Arc::new(client));
//!
//!     let source = import::parse("31452104\n10.1038/nature12373\n", SourceHint::PlainText)?;
//!     let job = controller.start(source, options)?;
//!     let report = job.wait().await;
//!     println!("{} imported, {} failed", report.successful_imports, report.failed_imports);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod formatters;
pub mod import;
pub mod models;
pub mod store;

pub use catalog::{CatalogId, ExternalCatalog};
pub use client::SemanticScholarClient;
pub use config::Config;
pub use dedup::{DuplicateDetector, MergeResolver, ScanSession};
pub use error::{ClientError, ImportError, JobError, StoreError};
pub use import::{BatchImportController, ImportJob, ImportSource, JobSource};
pub use models::{BatchImportJob, DuplicatePair, ImportOptions, PartialRecord, Record};
pub use store::{InMemoryStore, RecordStore};
