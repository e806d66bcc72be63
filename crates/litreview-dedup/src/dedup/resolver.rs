//! Applies merge/dismiss decisions to duplicate pairs.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::models::{DuplicatePair, KeepSide, PairStatus};
use crate::store::RecordStore;

/// Resolves duplicate pairs against the record store.
#[derive(Clone)]
pub struct MergeResolver {
    store: Arc<dyn RecordStore>,
}

impl MergeResolver {
    /// Resolver backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Keep one side and delete the other from the store.
    ///
    /// The pair only becomes `merged` after the store confirms the delete; on
    /// failure it stays as it was. Pairs that are already resolved are left alone.
    pub async fn keep(&self, pair: &mut DuplicatePair, side: KeepSide) -> StoreResult<()> {
        if !pair.is_pending() {
            tracing::debug!(pair = ?pair.key(), status = ?pair.status, "Pair already resolved");
            return Ok(());
        }

        let kept = pair.side(side).id.clone();
        let discarded = pair.other_side(side).id.clone();

        self.store.delete(&discarded).await?;
        pair.status = PairStatus::Merged;

        tracing::info!(
            kept = %kept,
            deleted = %discarded,
            match_type = pair.match_type.as_str(),
            "Merged duplicate pair"
        );
        Ok(())
    }

    /// Mark a pair as two distinct works. Touches nothing in the store.
    pub fn mark_not_duplicate(&self, pair: &mut DuplicatePair) {
        if pair.is_pending() {
            pair.status = PairStatus::NotDuplicate;
            tracing::debug!(pair = ?pair.key(), "Marked pair as not duplicate");
        }
    }

    /// Merge every pending `doi` / `exact-title` pair automatically.
    ///
    /// The side with more of `{doi, abstract, external id}` filled in is kept;
    /// ties keep side A. A record deleted earlier in the same pass is never
    /// deleted again: pairs referencing it stay pending. Per-pair store errors
    /// are logged and skipped; a fatal store error aborts the pass.
    ///
    /// Returns the number of merged pairs.
    pub async fn auto_merge_exact(&self, pairs: &mut [DuplicatePair]) -> StoreResult<usize> {
        let mut deleted: HashSet<String> = HashSet::new();
        let mut merged = 0;

        for pair in pairs.iter_mut() {
            if !pair.is_pending() || !pair.match_type.is_exact() {
                continue;
            }

            if deleted.contains(&pair.record_a.id) || deleted.contains(&pair.record_b.id) {
                tracing::debug!(pair = ?pair.key(), "Skipping pair whose record was already merged away");
                continue;
            }

            let side = if pair.record_a.completeness() >= pair.record_b.completeness() {
                KeepSide::A
            } else {
                KeepSide::B
            };
            let discarded = pair.other_side(side).id.clone();

            match self.keep(pair, side).await {
                Ok(()) => {
                    deleted.insert(discarded);
                    merged += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::warn!(pair = ?pair.key(), error = %e, "Auto-merge failed for pair");
                }
            }
        }

        tracing::info!(merged, "Auto-merge of exact duplicates finished");
        Ok(merged)
    }
}

impl std::fmt::Debug for MergeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeResolver").finish()
    }
}
