//! Scan sessions: the pairs of one detection run plus the decisions taken on them.

use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};
use crate::models::{DuplicatePair, KeepSide, PairKey, Record};

use super::{DuplicateDetector, MergeResolver};

/// Pairs found by a scan, resolved in place.
///
/// A pair resolved in this session is never re-emitted by [`ScanSession::refresh`],
/// even if the records still classify as duplicates.
#[derive(Debug, Default)]
pub struct ScanSession {
    detector: DuplicateDetector,
    pairs: Vec<DuplicatePair>,
    resolved: HashSet<PairKey>,
}

impl ScanSession {
    /// Run a scan and open a session over its results.
    #[must_use]
    pub fn scan(detector: DuplicateDetector, records: &[Record]) -> Self {
        let pairs = detector.detect(records);
        Self { detector, pairs, resolved: HashSet::new() }
    }

    /// All pairs of the session, resolved ones included.
    #[must_use]
    pub fn pairs(&self) -> &[DuplicatePair] {
        &self.pairs
    }

    /// Pairs still awaiting a decision.
    pub fn pending(&self) -> impl Iterator<Item = (usize, &DuplicatePair)> {
        self.pairs.iter().enumerate().filter(|(_, p)| p.is_pending())
    }

    /// Keep one side of the pair at `index`.
    pub async fn keep(
        &mut self,
        resolver: &MergeResolver,
        index: usize,
        side: KeepSide,
    ) -> StoreResult<()> {
        let pair = self
            .pairs
            .get_mut(index)
            .ok_or_else(|| StoreError::NotFound(format!("duplicate pair #{index}")))?;

        resolver.keep(pair, side).await?;
        self.resolved.insert(pair.key());
        Ok(())
    }

    /// Dismiss the pair at `index`. Returns false if there is no such pair.
    pub fn mark_not_duplicate(&mut self, resolver: &MergeResolver, index: usize) -> bool {
        let Some(pair) = self.pairs.get_mut(index) else {
            return false;
        };

        resolver.mark_not_duplicate(pair);
        self.resolved.insert(pair.key());
        true
    }

    /// Auto-merge every pending exact pair of the session.
    pub async fn auto_merge_exact(&mut self, resolver: &MergeResolver) -> StoreResult<usize> {
        let merged = resolver.auto_merge_exact(&mut self.pairs).await?;
        self.resolved.extend(self.pairs.iter().filter(|p| !p.is_pending()).map(DuplicatePair::key));
        Ok(merged)
    }

    /// Re-scan the current corpus, keeping decisions already taken.
    ///
    /// Resolved pairs stay in the session as they are; pending pairs are
    /// replaced by the fresh scan, minus any pair resolved earlier.
    pub fn refresh(&mut self, records: &[Record]) {
        let mut pairs: Vec<DuplicatePair> =
            self.pairs.drain(..).filter(|p| !p.is_pending()).collect();

        pairs.extend(
            self.detector.detect(records).into_iter().filter(|p| !self.resolved.contains(&p.key())),
        );

        self.pairs = pairs;
    }
}
