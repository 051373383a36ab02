// src/normalize/supplier.rs - Aggressive cleaning profile for supplier names
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::tables::{SUPPLIER_SUFFIXES, SUPPLIER_SUFFIX_SET};

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("static regex"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

const PAREN_KEEP_POSITION: usize = 3;
// Agglutinated suffix stripping ("PharmaCorp" -> "pharma") only fires for a
// reasonably long suffix and a reasonably long stem, so "Lupin" keeps its
// trailing "in" and "Roche" its trailing "ch".
const MIN_AGGLUTINATED_SUFFIX_LEN: usize = 4;
const MIN_STEM_LEN: usize = 4;

/// Clean a supplier/site name for approximate comparison: lower-case, drop
/// late parentheticals, strip punctuation and digits, then peel corporate
/// and industry suffix words off the tail. The first remaining token is
/// never removed, so a bare "Pharma Corp" still cleans to "pharma" rather
/// than an empty string.
pub fn clean_supplier_name(name: &str) -> String {
    let mut name = name.to_lowercase();

    if let Some(pos) = name.find('(') {
        if pos > PAREN_KEEP_POSITION {
            name = PARENTHETICAL.replace_all(&name, "").into_owned();
        }
    }

    let name = PUNCTUATION.replace_all(&name, "");
    let name = DIGITS.replace_all(&name, "");

    let mut tokens: Vec<String> = name.split_whitespace().map(str::to_string).collect();
    loop {
        let mut changed = false;
        while tokens.len() > 1 {
            let last = tokens.last().map(String::as_str).unwrap_or("");
            if SUPPLIER_SUFFIX_SET.contains(last) {
                tokens.pop();
                changed = true;
            } else {
                break;
            }
        }
        if let Some(last) = tokens.last_mut() {
            if let Some(stem) = strip_agglutinated_suffix(last) {
                *last = stem;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let joined = tokens.join(" ");
    WHITESPACE_RUN.replace_all(&joined, " ").trim().to_string()
}

/// If the token ends in a known suffix word glued onto a longer stem,
/// return the stem. Longest suffix wins.
fn strip_agglutinated_suffix(token: &str) -> Option<String> {
    static BY_LENGTH: Lazy<Vec<&'static str>> = Lazy::new(|| {
        let mut suffixes: Vec<&str> = SUPPLIER_SUFFIXES
            .iter()
            .copied()
            .filter(|s| s.len() >= MIN_AGGLUTINATED_SUFFIX_LEN)
            .collect();
        suffixes.sort_by_key(|s| std::cmp::Reverse(s.len()));
        suffixes
    });

    for suffix in BY_LENGTH.iter() {
        if token.len() > suffix.len() && token.ends_with(suffix) {
            let stem = token[..token.len() - suffix.len()]
                .trim_end_matches(|c: char| !c.is_alphanumeric());
            if stem.chars().count() >= MIN_STEM_LEN {
                return Some(stem.to_string());
            }
        }
    }
    None
}
