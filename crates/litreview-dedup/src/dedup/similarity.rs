//! String similarity and author overlap predicates.

use std::collections::HashSet;

/// Similarity of two strings on a 0..=100 scale.
///
/// Both strings are lower-cased, then compared by Levenshtein distance
/// relative to the longer one: `round(100 * (max_len - distance) / max_len)`.
/// Identical strings (including two empty strings) score 100. Symmetric and total.
#[must_use]
pub fn similarity(a: &str, b: &str) -> u8 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    if a == b {
        return 100;
    }

    let max_len = a.chars().count().max(b.chars().count());

    let distance = strsim::levenshtein(&a, &b);
    let score = 100.0 * (max_len - distance) as f64 / max_len as f64;
    score.round() as u8
}

/// Whether two author lists share at least one surname.
///
/// The surname is the last whitespace-separated token of a name, lower-cased.
/// Names written as `"Surname, Given"` use the part before the comma instead.
/// Empty lists never overlap.
#[must_use]
pub fn authors_overlap<A, B>(authors_a: &[A], authors_b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if authors_a.is_empty() || authors_b.is_empty() {
        return false;
    }

    let surnames_a = surnames(authors_a);
    if surnames_a.is_empty() {
        return false;
    }

    authors_b.iter().filter_map(|name| surname(name.as_ref())).any(|s| surnames_a.contains(&s))
}

fn surnames<A: AsRef<str>>(authors: &[A]) -> HashSet<String> {
    authors.iter().filter_map(|name| surname(name.as_ref())).collect()
}

fn surname(name: &str) -> Option<String> {
    let family = match name.split_once(',') {
        Some((before, _)) if !before.trim().is_empty() => before,
        _ => name,
    };

    family.split_whitespace().last().map(str::to_lowercase)
}
