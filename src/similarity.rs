//! Closest-match suggestions for failed metric lookups
//!
//! When a test asks for a metric family that does not exist, the lookup error
//! lists the known names closest to the requested one by edit distance.

/// Levenshtein distance between two strings.
///
/// Insertions, deletions and substitutions each cost 1. The comparison is
/// case-sensitive and works on Unicode scalar values, not bytes.
///
/// # Examples
/// ```rust
/// use tyl_metrics_assert::levenshtein_distance;
///
/// assert_eq!(levenshtein_distance("foo", "afoo"), 1);
/// assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
/// ```
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    if b.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Finds the `n` candidates most similar to `reference`.
///
/// Candidates are ordered by ascending edit distance. Candidates at the same
/// distance keep their relative order from `candidates`, and duplicates are
/// kept as separate entries. The result holds `min(n, candidates.len())`
/// entries; an empty pool or `n == 0` yields an empty result.
///
/// # Examples
/// ```rust
/// use tyl_metrics_assert::top_similar;
///
/// let pool = ["afoo", "foobar", "abcfooefg", "afooba", "afoob"];
/// assert_eq!(top_similar("foo", &pool, 3), vec!["afoo", "afoob", "foobar"]);
/// ```
pub fn top_similar<S: AsRef<str>>(reference: &str, candidates: &[S], n: usize) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .iter()
        .map(|candidate| {
            let candidate = candidate.as_ref();
            (levenshtein_distance(reference, candidate), candidate)
        })
        .collect();

    // sort_by_key is stable: ties stay in pool order
    scored.sort_by_key(|(distance, _)| *distance);

    scored
        .into_iter()
        .take(n)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}
