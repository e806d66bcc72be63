//! Candidate duplicate pairs produced by a detection scan.

use serde::{Deserialize, Serialize};

use super::Record;

/// Which rule classified a pair, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    /// Same DOI.
    Doi,
    /// Case-insensitive identical title.
    ExactTitle,
    /// Title similarity above the fuzzy threshold.
    FuzzyTitle,
    /// Shared author surname, same publication date, similar title.
    AuthorYearSimilar,
}

impl MatchType {
    /// Exact match types may be merged without a human decision.
    #[must_use]
    pub const fn is_exact(self) -> bool {
        matches!(self, Self::Doi | Self::ExactTitle)
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Doi => "doi",
            Self::ExactTitle => "exact-title",
            Self::FuzzyTitle => "fuzzy-title",
            Self::AuthorYearSimilar => "author-year-similar",
        }
    }
}

/// Resolution state of a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PairStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// One side was deleted.
    Merged,
    /// Both records are distinct works.
    NotDuplicate,
}

/// Side of a pair to keep when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepSide {
    /// Keep `record_a`, delete `record_b`.
    A,
    /// Keep `record_b`, delete `record_a`.
    B,
}

/// Order-independent identity of a pair, by record ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    /// Build a key from two record ids.
    #[must_use]
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b { Self(a.to_string(), b.to_string()) } else { Self(b.to_string(), a.to_string()) }
    }
}

/// Two records believed to describe the same work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePair {
    /// Earlier record in scan order.
    pub record_a: Record,

    /// Later record in scan order.
    pub record_b: Record,

    /// Similarity score, 0..=100.
    pub similarity: u8,

    /// Rule that matched.
    pub match_type: MatchType,

    /// Resolution state.
    #[serde(default)]
    pub status: PairStatus,
}

impl DuplicatePair {
    /// New pending pair.
    #[must_use]
    pub fn new(record_a: Record, record_b: Record, similarity: u8, match_type: MatchType) -> Self {
        Self { record_a, record_b, similarity, match_type, status: PairStatus::Pending }
    }

    /// Identity of the pair.
    #[must_use]
    pub fn key(&self) -> PairKey {
        PairKey::new(&self.record_a.id, &self.record_b.id)
    }

    /// Whether a decision is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == PairStatus::Pending
    }

    /// Record on the given side.
    #[must_use]
    pub const fn side(&self, side: KeepSide) -> &Record {
        match side {
            KeepSide::A => &self.record_a,
            KeepSide::B => &self.record_b,
        }
    }

    /// Record on the opposite side of `keep`.
    #[must_use]
    pub const fn other_side(&self, keep: KeepSide) -> &Record {
        match keep {
            KeepSide::A => &self.record_b,
            KeepSide::B => &self.record_a,
        }
    }

    /// Whether either side is the record with `id`.
    #[must_use]
    pub fn involves(&self, id: &str) -> bool {
        self.record_a.id == id || self.record_b.id == id
    }
}
