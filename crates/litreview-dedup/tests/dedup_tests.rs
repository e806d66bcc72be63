//! Detection and resolution over a store-backed corpus.

use std::sync::Arc;

use litreview_dedup::dedup::{DuplicateDetector, MergeResolver, ScanSession, similarity};
use litreview_dedup::models::{KeepSide, MatchType, PairStatus, PartialRecord, Record};
use litreview_dedup::store::{InMemoryStore, ProjectScope, RecordStore};

fn record(id: &str, title: &str) -> Record {
    Record { id: id.to_string(), title: title.to_string(), ..Record::default() }
}

fn authored(id: &str, title: &str, authors: &[&str], date: &str) -> Record {
    Record {
        authors: authors.iter().map(|a| (*a).to_string()).collect(),
        publication_date: Some(date.to_string()),
        ..record(id, title)
    }
}

// =============================================================================
// Classification
// =============================================================================

#[test]
fn test_exact_title_ignores_case() {
    let pairs = DuplicateDetector::new()
        .detect(&[record("1", "Effect of X on Y"), record("2", "effect of x on y")]);

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_type, MatchType::ExactTitle);
    assert_eq!(pairs[0].similarity, 100);
    assert_eq!(pairs[0].status, PairStatus::Pending);
}

#[test]
fn test_shared_doi_beats_title() {
    let a = Record { doi: Some("10.1000/xyz".into()), ..record("1", "Sepsis in adults") };
    let b = Record { doi: Some("10.1000/xyz".into()), ..record("2", "A different title") };

    let pairs = DuplicateDetector::new().detect(&[a, b]);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_type, MatchType::Doi);
    assert_eq!(pairs[0].similarity, 100);
}

#[test]
fn test_author_year_similar() {
    let a = authored("1", "Sepsis mortality in adults", &["Smith, J", "Doe, A"], "2021");
    let b = authored("2", "Sepsis mortality in children", &["Smith, John", "Lee, B"], "2021");
    assert_eq!(similarity(&a.title, &b.title), 75);

    let pairs = DuplicateDetector::new().detect(&[a, b]);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_type, MatchType::AuthorYearSimilar);
    assert_eq!(pairs[0].similarity, 75);
}

#[test]
fn test_custom_thresholds() {
    let a = authored("1", "Sepsis mortality in adults", &["Smith, J"], "2021");
    let b = authored("2", "Sepsis mortality in children", &["Smith, John"], "2021");
    let records = [a, b];

    // Stricter author-year bar drops the 75% pair
    assert!(DuplicateDetector::with_thresholds(85, 80).detect(&records).is_empty());

    // Looser fuzzy bar claims it before the author-year rule
    let pairs = DuplicateDetector::with_thresholds(70, 70).detect(&records);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_type, MatchType::FuzzyTitle);
    assert_eq!(pairs[0].similarity, 75);
}

#[test]
fn test_author_year_needs_every_condition() {
    let base = authored("1", "Sepsis mortality in adults", &["Smith, J"], "2021");

    let other_year = authored("2", "Sepsis mortality in children", &["Smith, J"], "2022");
    let other_authors = authored("3", "Sepsis mortality in children", &["Lee, B"], "2021");
    let no_date = Record { publication_date: None, ..other_year.clone() };

    let detector = DuplicateDetector::new();
    assert!(detector.detect(&[base.clone(), other_year]).is_empty());
    assert!(detector.detect(&[base.clone(), other_authors]).is_empty());
    assert!(detector.detect(&[base, no_date]).is_empty());
}

#[test]
fn test_fuzzy_title() {
    let pairs = DuplicateDetector::new().detect(&[
        record("1", "A randomized trial of statins"),
        record("2", "A randomised trial of statins"),
    ]);

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].match_type, MatchType::FuzzyTitle);
    assert_eq!(pairs[0].similarity, 97);
}

#[test]
fn test_detection_is_deterministic_and_ordered() {
    let records = vec![
        record("1", "Sepsis mortality in adults"),
        record("2", "Statin therapy and stroke"),
        record("3", "SEPSIS MORTALITY IN ADULTS"),
        record("4", "Statin therapy and strokes"),
        record("5", "Unrelated"),
    ];

    let detector = DuplicateDetector::new();
    let first = detector.detect(&records);
    let second = detector.detect(&records);
    assert_eq!(first, second);

    let ids: Vec<_> =
        first.iter().map(|p| (p.record_a.id.as_str(), p.record_b.id.as_str())).collect();
    assert_eq!(ids, vec![("1", "3"), ("2", "4")]);
    assert!(first.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

// =============================================================================
// Resolution
// =============================================================================

async fn seeded_store(records: Vec<PartialRecord>) -> (Arc<InMemoryStore>, Vec<Record>) {
    let store = Arc::new(InMemoryStore::new());
    for record in records {
        store.insert(record, None).await.unwrap();
    }
    let all = store.list_all(&ProjectScope::All).await.unwrap();
    (store, all)
}

#[tokio::test]
async fn test_auto_merge_keeps_more_complete_side() {
    let complete = PartialRecord {
        doi: Some("10.1/a".into()),
        r#abstract: Some("Abstract".into()),
        ..PartialRecord::titled("Trial one")
    };
    let sparse = PartialRecord { doi: Some("10.1/a".into()), ..PartialRecord::titled("Trial 1") };

    let (store, records) = seeded_store(vec![complete, sparse]).await;
    let mut session = ScanSession::scan(DuplicateDetector::new(), &records);
    assert_eq!(session.pairs()[0].match_type, MatchType::Doi);

    let resolver = MergeResolver::new(store.clone());
    let merged = session.auto_merge_exact(&resolver).await.unwrap();

    assert_eq!(merged, 1);
    assert_eq!(session.pairs()[0].status, PairStatus::Merged);
    assert!(store.get(&records[0].id).await.is_some());
    assert!(store.get(&records[1].id).await.is_none());
}

#[tokio::test]
async fn test_manual_resolution_survives_refresh() {
    let (store, records) = seeded_store(vec![
        PartialRecord::titled("Statin therapy and stroke"),
        PartialRecord::titled("Statin therapy and strokes"),
        PartialRecord::titled("Sepsis mortality in adults"),
        PartialRecord::titled("Sepsis mortality in adults."),
    ])
    .await;

    let resolver = MergeResolver::new(store.clone());
    let mut session = ScanSession::scan(DuplicateDetector::new(), &records);
    assert_eq!(session.pending().count(), 2);

    // Fuzzy pairs are never auto-merged
    assert_eq!(session.auto_merge_exact(&resolver).await.unwrap(), 0);

    let (first, _) = session.pending().next().unwrap();
    assert!(session.mark_not_duplicate(&resolver, first));

    let (second, pair) = session.pending().next().unwrap();
    let deleted = pair.record_b.id.clone();
    session.keep(&resolver, second, KeepSide::A).await.unwrap();
    assert!(store.get(&deleted).await.is_none());

    let remaining = store.list_all(&ProjectScope::All).await.unwrap();
    session.refresh(&remaining);

    assert_eq!(session.pending().count(), 0);
    assert_eq!(session.pairs().len(), 2);
    assert!(!store.is_empty().await);
}
