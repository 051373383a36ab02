// src/normalize/base.rs - Base canonicalization applied to every raw identifier
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::normalize::tables::{MISSPELLING_PATTERNS, SYMBOL_SUBSTITUTIONS};

// Punctuation class excludes '_' so the `_alpha_` symbol tokens introduced
// by the substitution table survive as single word-like tokens.
static PUNCT_THEN_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^\w\s])([0-9A-Za-z])").expect("static regex"));
static ALNUM_THEN_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9A-Za-z])([^\w\s])").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static UNDERSCORE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").expect("static regex"));

/// Reduce a raw identifier to its canonical comparable form.
///
/// The pipeline is fixed-order and locale-independent:
/// 1. whole-word misspelling correction, longest pattern first;
/// 2. symbol-to-token substitution, then diacritic/ligature transliteration;
/// 3. bracket unification to parentheses and inner-space collapse;
/// 4. a separating space between punctuation and adjoining alphanumerics
///    ("V2.0" becomes "V2 . 0", never "V20");
/// 5. whitespace and underscore-run collapse, trim.
///
/// Total: never fails, and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();

    for (re, replacement) in MISSPELLING_PATTERNS.iter() {
        if re.is_match(&text) {
            text = re.replace_all(&text, *replacement).into_owned();
        }
    }

    for (symbol, replacement) in SYMBOL_SUBSTITUTIONS {
        if text.contains(symbol) {
            text = text.replace(symbol, replacement);
        }
    }

    text = transliterate(&text);

    // Bracket variants were already folded to parentheses by the symbol
    // table; normalize the spacing just inside them.
    text = text.replace("( ", "(").replace(" )", ")");

    let text = PUNCT_THEN_ALNUM.replace_all(&text, "$1 $2");
    let text = ALNUM_THEN_PUNCT.replace_all(&text, "$1 $2");

    let text = WHITESPACE_RUN.replace_all(&text, " ");
    let text = UNDERSCORE_RUN.replace_all(&text, "_");
    text.trim().to_string()
}

/// Strip diacritics via NFD decomposition and fold the few Latin letters
/// that decompose to nothing useful.
fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ch {
            'ø' => out.push('o'),
            'Ø' => out.push('O'),
            'đ' => out.push('d'),
            'Đ' => out.push('D'),
            'ł' => out.push('l'),
            'Ł' => out.push('L'),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrects_known_misspellings() {
        assert_eq!(normalize("ACETAMINOFEN"), "ACETAMINOPHEN");
        assert_eq!(normalize("xenon -133"), "XENON XE - 133");
    }

    #[test]
    fn misspelling_is_whole_word_only() {
        // "Adenosine" already ends in 'e'; the "Adenosin" rule must not fire.
        assert_eq!(normalize("Adenosine"), "Adenosine");
    }

    #[test]
    fn strips_diacritics_but_keeps_case() {
        assert_eq!(normalize("Müller Söhne"), "Muller Sohne");
        assert_eq!(normalize("Crème brûlée"), "Creme brulee");
    }

    #[test]
    fn symbol_tokens_survive_as_words() {
        assert_eq!(normalize("β-Estradiol"), "_beta_ - Estradiol");
        assert_eq!(normalize("Substance™"), "Substance _tm_");
        assert_eq!(normalize("AT&T"), "AT and T");
    }

    #[test]
    fn bracket_variants_become_parentheses() {
        // Punctuation spacing re-opens the parentheses afterwards, which is
        // stable under repeated normalization.
        assert_eq!(normalize("Compound [A]"), "Compound ( A )");
        assert_eq!(normalize("Compound { B }"), "Compound ( B )");
    }

    #[test]
    fn punctuation_gets_breathing_room() {
        assert_eq!(normalize("V2.0"), "V2 . 0");
        assert_eq!(normalize("Test/ID"), "Test / ID");
    }

    #[test]
    fn whitespace_and_underscore_runs_collapse() {
        assert_eq!(normalize("  a   b  "), "a b");
        assert_eq!(normalize("substance__x__y"), "substance_x_y");
    }

    #[test]
    fn idempotent_on_representative_inputs() {
        for raw in [
            "TEST ® ID / V.2",
            "   Substance—X™   ",
            "Beta αnd γ Kräuter",
            "Compound [A+B]",
            "‘Test’ – Product #1",
            "Na±ion",
            "Müller & Söhne",
            "AMIODARONE HYDROCHLORIDE USP (for injection) 50mg",
            "",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not a fixed point for {:?}", raw);
        }
    }
}
