//! Batch import: source parsing and the background job controller.

mod controller;
mod job;
mod source;
mod worker;

pub use controller::{BatchImportController, JobSource};
pub use job::ImportJob;
pub use source::{ImportSource, SourceHint, parse, parse_file};
pub use worker::DUPLICATE_DETECTED;
