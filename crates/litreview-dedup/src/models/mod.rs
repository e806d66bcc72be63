//! Data models for records, duplicate pairs, import jobs and catalog responses.
//!
//! All models use `#[serde(default)]` for optional fields and
//! `#[serde(rename_all = "camelCase")]` for the JSON representation.

mod duplicate;
mod job;
mod paper;
mod record;

pub use duplicate::{DuplicatePair, KeepSide, MatchType, PairKey, PairStatus};
pub use job::{BatchImportJob, ImportOptions, ItemError, ItemErrorKind, JobStatus};
pub use paper::{AuthorRef, ExternalIds, Journal, Paper, SearchResult};
pub(crate) use record::non_empty;
pub use record::{Bibliographic, PartialRecord, Record, RecordSource, meta};
