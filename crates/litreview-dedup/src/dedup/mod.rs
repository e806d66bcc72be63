//! Duplicate detection and resolution.
//!
//! - [`similarity`] / [`authors_overlap`]: pure string predicates
//! - [`DuplicateDetector`]: tiered pairwise classifier over a corpus
//! - [`MergeResolver`]: keep-one / not-duplicate decisions against the store
//! - [`ScanSession`]: pairs of one scan with their decisions

mod detector;
mod resolver;
mod session;
mod similarity;

pub use detector::{
    AUTHOR_YEAR_TITLE_THRESHOLD, Classification, DuplicateDetector, FUZZY_TITLE_THRESHOLD,
    classify_exact,
};
pub use resolver::MergeResolver;
pub use session::ScanSession;
pub use similarity::{authors_overlap, similarity};
