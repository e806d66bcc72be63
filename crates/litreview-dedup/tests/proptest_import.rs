//! Property-based tests for import source parsing.

use proptest::prelude::*;

use litreview_dedup::import::{self, ImportSource, SourceHint};

proptest! {
    /// Parsing never panics, whatever the input and hint.
    #[test]
    fn parse_never_panics(raw in ".{0,400}", tabular in any::<bool>(), tab in any::<bool>()) {
        let hint = match (tabular, tab) {
            (false, _) => SourceHint::PlainText,
            (true, false) => SourceHint::CSV,
            (true, true) => SourceHint::TSV,
        };
        let _ = import::parse(&raw, hint);
    }

    /// A list of numeric ids keeps every non-blank line, trimmed and in order.
    #[test]
    fn id_list_preserves_lines(
        ids in proptest::collection::vec("[0-9]{1,9}", 1..30),
        padding in " {0,3}",
    ) {
        let raw: String = ids.iter().map(|id| format!("{padding}{id}{padding}\n\n")).collect();

        let source = import::parse(&raw, SourceHint::PlainText).unwrap();
        prop_assert_eq!(source, ImportSource::IdList { ids: ids.clone() });
    }

    /// Every tabular row with a title becomes a record; the rest are dropped.
    #[test]
    fn tabular_rows_with_titles_are_kept(
        titles in proptest::collection::vec(proptest::option::of("[A-Za-z][A-Za-z ]{0,30}"), 0..20),
    ) {
        let mut raw = String::from("title,journal\n");
        for title in &titles {
            raw.push_str(&format!("{},Some journal\n", title.as_deref().unwrap_or("")));
        }

        let ImportSource::Tabular { records } = import::parse(&raw, SourceHint::CSV).unwrap() else {
            return Err(TestCaseError::fail("expected tabular source"));
        };

        let expected: Vec<String> = titles.iter().flatten().map(|t| t.trim().to_string()).collect();
        let actual: Vec<String> = records.into_iter().map(|r| r.title).collect();
        prop_assert_eq!(actual, expected);
    }
}
