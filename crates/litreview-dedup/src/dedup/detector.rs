//! Pairwise duplicate classification over a record corpus.

use crate::models::{Bibliographic, DuplicatePair, MatchType, Record};

use super::similarity::{authors_overlap, similarity};

/// Title similarity a pair must exceed to be a `fuzzy-title` match.
pub const FUZZY_TITLE_THRESHOLD: u8 = 85;

/// Title similarity a pair must exceed to be an `author-year-similar` match.
pub const AUTHOR_YEAR_TITLE_THRESHOLD: u8 = 70;

/// Outcome of classifying one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Rule that matched.
    pub match_type: MatchType,
    /// Score, 0..=100.
    pub similarity: u8,
}

impl Classification {
    const fn new(match_type: MatchType, similarity: u8) -> Self {
        Self { match_type, similarity }
    }
}

/// Classifies record pairs with prioritized, short-circuiting rules.
///
/// 1. `doi`: both DOIs present and equal (ASCII case-insensitive).
/// 2. `exact-title`: titles equal ignoring case.
/// 3. `fuzzy-title`: title similarity above [`FUZZY_TITLE_THRESHOLD`].
/// 4. `author-year-similar`: shared surname, identical publication date and
///    title similarity above [`AUTHOR_YEAR_TITLE_THRESHOLD`].
///
/// Missing fields fail their rule and fall through; blank titles never match
/// on title.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    fuzzy_threshold: u8,
    author_year_threshold: u8,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateDetector {
    /// Detector with the standard thresholds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fuzzy_threshold: FUZZY_TITLE_THRESHOLD,
            author_year_threshold: AUTHOR_YEAR_TITLE_THRESHOLD,
        }
    }

    /// Override the title thresholds.
    #[must_use]
    pub const fn with_thresholds(fuzzy_threshold: u8, author_year_threshold: u8) -> Self {
        Self { fuzzy_threshold, author_year_threshold }
    }

    /// Scan every unordered pair `(i, j)`, `i < j`, and return the classified ones.
    ///
    /// Output is sorted by descending similarity; ties keep scan order.
    /// Every pair starts out pending.
    #[must_use]
    pub fn detect(&self, records: &[Record]) -> Vec<DuplicatePair> {
        let mut pairs = Vec::new();

        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                if let Some(found) = self.classify(a, b) {
                    pairs.push(DuplicatePair::new(
                        a.clone(),
                        b.clone(),
                        found.similarity,
                        found.match_type,
                    ));
                }
            }
        }

        // sort_by is stable: equal scores stay in scan order
        pairs.sort_by(|x, y| y.similarity.cmp(&x.similarity));

        tracing::info!(records = records.len(), pairs = pairs.len(), "Duplicate scan finished");
        pairs
    }

    /// Classify one pair with all four rules.
    #[must_use]
    pub fn classify<A, B>(&self, a: &A, b: &B) -> Option<Classification>
    where
        A: Bibliographic + ?Sized,
        B: Bibliographic + ?Sized,
    {
        if let Some(exact) = classify_exact(a, b) {
            return Some(exact);
        }

        if is_blank(a.title()) || is_blank(b.title()) {
            return None;
        }

        let title_score = similarity(a.title(), b.title());

        if title_score > self.fuzzy_threshold {
            return Some(Classification::new(MatchType::FuzzyTitle, title_score));
        }

        let same_date = matches!(
            (a.publication_date(), b.publication_date()),
            (Some(x), Some(y)) if x == y
        );

        if same_date
            && title_score > self.author_year_threshold
            && authors_overlap(a.authors(), b.authors())
        {
            return Some(Classification::new(MatchType::AuthorYearSimilar, title_score));
        }

        None
    }
}

/// Classify with the exact rules only (`doi`, then `exact-title`).
///
/// These are the rules safe to apply without a human decision; import-time
/// duplicate suppression uses exactly this subset.
#[must_use]
pub fn classify_exact<A, B>(a: &A, b: &B) -> Option<Classification>
where
    A: Bibliographic + ?Sized,
    B: Bibliographic + ?Sized,
{
    if let (Some(doi_a), Some(doi_b)) = (a.doi(), b.doi()) {
        if doi_a.eq_ignore_ascii_case(doi_b) {
            return Some(Classification::new(MatchType::Doi, 100));
        }
    }

    if !is_blank(a.title()) && a.title().to_lowercase() == b.title().to_lowercase() {
        return Some(Classification::new(MatchType::ExactTitle, 100));
    }

    None
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
