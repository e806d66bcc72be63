//! Fuzzing library for litreview-dedup.
//!
//! This crate provides fuzzing targets for the import source parser and
//! the JSON deserialization of records and catalog responses.
//!
//! # Usage
//!
//! ```bash
//! cd crates/sentinel-fuzz
//! cargo +nightly fuzz run fuzz_import_parse -- -max_total_time=60
//! ```

pub use litreview_dedup::{import, models};
