// src/matching/scorers.rs - Indel-distance similarity scorers, 0.0 to 100.0
use std::collections::BTreeSet;

/// A similarity scorer over two strings, returning a percentage in
/// [0.0, 100.0]. All scorers here are based on insert/delete edit distance,
/// so a single substitution costs two operations.
pub type Scorer = fn(&str, &str) -> f64;

/// The ensemble run against original (uncleaned) strings. The cheap
/// token-set scorer goes first so short-circuiting callers usually stop
/// after one call.
pub const SCORERS_ORIGINAL: [Scorer; 4] = [token_set_ratio, ratio, partial_ratio, token_sort_ratio];

/// The ensemble run against cleaned strings. Cleaning already removed the
/// noise that `ratio` and `partial_ratio` exist to tolerate.
pub const SCORERS_CLEANED: [Scorer; 2] = [token_sort_ratio, token_set_ratio];

/// True if any scorer in the ensemble reaches `threshold`. Scorers are
/// tried in order and evaluation stops at the first success.
pub fn any_meets(scorers: &[Scorer], s1: &str, s2: &str, threshold: f64) -> bool {
    scorers.iter().any(|scorer| scorer(s1, s2) >= threshold)
}

pub fn max_score(scorers: &[Scorer], s1: &str, s2: &str) -> f64 {
    scorers
        .iter()
        .map(|scorer| scorer(s1, s2))
        .fold(0.0, f64::max)
}

/// Whole-string similarity: `(1 - indel / (len1 + len2)) * 100`, which is
/// `2 * lcs / (len1 + len2) * 100`. Two empty strings are identical.
pub fn ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    ratio_chars(&a, &b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    (2 * lcs_length(a, b)) as f64 / total as f64 * 100.0
}

/// Length of the longest common subsequence, two-row dynamic program.
fn lcs_length(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Best `ratio` of the shorter string against every window of its own
/// length in the longer string. Tolerates one string being embedded in the
/// other ("aspirin" in "aspirin 500mg tablets").
pub fn partial_ratio(s1: &str, s2: &str) -> f64 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if shorter.is_empty() {
        return if longer.is_empty() { 100.0 } else { 0.0 };
    }

    let mut best: f64 = 0.0;
    for start in 0..=(longer.len() - shorter.len()) {
        let window = &longer[start..start + shorter.len()];
        best = best.max(ratio_chars(shorter, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// `ratio` after sorting whitespace-separated tokens, so word order does
/// not matter.
pub fn token_sort_ratio(s1: &str, s2: &str) -> f64 {
    ratio(&sorted_tokens(s1), &sorted_tokens(s2))
}

/// Token-set similarity: split both strings into token sets, then take the
/// best `ratio` among the intersection and the two intersection-plus-rest
/// reconstructions. Forgiving of one side carrying extra tokens.
pub fn token_set_ratio(s1: &str, s2: &str) -> f64 {
    let set1: BTreeSet<&str> = s1.split_whitespace().collect();
    let set2: BTreeSet<&str> = s2.split_whitespace().collect();

    let intersection = join(set1.intersection(&set2));
    let diff1 = join(set1.difference(&set2));
    let diff2 = join(set2.difference(&set1));

    let combined1 = concat_tokens(&intersection, &diff1);
    let combined2 = concat_tokens(&intersection, &diff2);

    ratio(&intersection, &combined1)
        .max(ratio(&intersection, &combined2))
        .max(ratio(&combined1, &combined2))
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<'a>(tokens: impl Iterator<Item = &'a &'a str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn concat_tokens(head: &str, tail: &str) -> String {
    if head.is_empty() {
        tail.to_string()
    } else if tail.is_empty() {
        head.to_string()
    } else {
        format!("{} {}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_counts_substitutions_as_two_edits() {
        // "prazepam" vs "lorazepam": lcs "razepam" (7), lengths 8 + 9.
        let score = ratio("prazepam", "lorazepam");
        assert!((score - 82.35).abs() < 0.01, "got {}", score);
    }

    #[test]
    fn ratio_edge_cases() {
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("abc", "abc"), 100.0);
        assert_eq!(ratio("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn partial_ratio_finds_embedded_names() {
        assert_eq!(partial_ratio("aspirin", "aspirin 500mg tablets"), 100.0);
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "aspirin"), 0.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(
            token_sort_ratio("sodium naproxen", "naproxen sodium"),
            100.0
        );
    }

    #[test]
    fn token_set_forgives_extra_tokens() {
        assert_eq!(
            token_set_ratio("amiodarone", "amiodarone hydrochloride"),
            100.0
        );
        // Duplicate tokens collapse into the set.
        assert_eq!(token_set_ratio("urea urea", "urea"), 100.0);
    }

    #[test]
    fn token_set_on_disjoint_single_tokens_degrades_to_ratio() {
        let score = token_set_ratio("prazepam", "lorazepam");
        assert!((score - 82.35).abs() < 0.01, "got {}", score);
    }

    #[test]
    fn ensemble_short_circuits_on_threshold() {
        assert!(any_meets(
            &SCORERS_CLEANED,
            "prazepam",
            "lorazepam",
            80.0
        ));
        assert!(!any_meets(
            &SCORERS_CLEANED,
            "prazepam",
            "lorazepam",
            90.0
        ));
        let best = max_score(&SCORERS_ORIGINAL, "naproxen sodium", "sodium naproxen");
        assert_eq!(best, 100.0);
    }
}
