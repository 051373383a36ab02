// src/normalize/substance.rs - Aggressive cleaning profile for substance names
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::tables::{SUBSTANCE_ABBREV_MAP, SUBSTANCE_ABBREV_RE};

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)").expect("static regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/-]").expect("static regex"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

// A parenthetical opening this early is part of the primary name (isotopic
// labels like "(13C)-Urea"), not a droppable qualifier.
const PAREN_KEEP_POSITION: usize = 3;

/// Clean a substance name for approximate comparison: lower-case, drop late
/// parentheticals, fold the y/i spelling variant, expand or remove
/// pharmacopeia and dosage-form abbreviations, then strip separators and
/// punctuation. A result shorter than three characters is returned as-is;
/// emptiness is a signal, not an error.
pub fn clean_substance_name(name: &str) -> String {
    let mut name = name.to_lowercase();

    if let Some(pos) = name.find('(') {
        if pos > PAREN_KEEP_POSITION {
            name = PARENTHETICAL.replace_all(&name, "").into_owned();
        }
    }

    // Spelling variant fold, before abbreviation expansion so expansions
    // keep their canonical spelling.
    name = name.replace('y', "i");

    let name = SUBSTANCE_ABBREV_RE.replace_all(&name, |caps: &regex::Captures| {
        SUBSTANCE_ABBREV_MAP
            .get(&caps[1].to_lowercase())
            .copied()
            .unwrap_or("")
            .to_string()
    });

    let name = SEPARATORS.replace_all(&name, " ");
    let name = PUNCTUATION.replace_all(&name, "");
    let name = WHITESPACE_RUN.replace_all(&name, " ");
    name.trim().to_string()
}
