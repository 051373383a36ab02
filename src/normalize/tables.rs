// src/normalize/tables.rs - Fixed substitution tables, compiled once at startup
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Known transcription errors observed in the source feeds, corrected as
/// whole words before any other normalization.
pub(crate) const MISSPELLINGS: &[(&str, &str)] = &[
    ("XENON -133", "XENON XE-133"),
    ("ACETAMINOFEN", "ACETAMINOPHEN"),
    ("ACETAZOLAMIDE 500MG SRC", "ACETAZOLAMIDE"),
    ("Adenosin", "Adenosine"),
];

/// Symbol-to-token substitutions. Greek letters and trademark markers carry
/// semantic weight in chemical names, so they become word-like `_x_` tokens
/// instead of vanishing during transliteration. Applied before diacritic
/// folding so the original codepoints are still present.
pub(crate) const SYMBOL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("®", " _r_ "),
    ("©", " _c_ "),
    ("™", " _tm_ "),
    ("ß", "ss"),
    ("α", " _alpha_ "),
    ("β", " _beta_ "),
    ("γ", " _gamma_ "),
    ("δ", " _delta_ "),
    ("ε", " _epsilon_ "),
    ("ζ", " _zeta_ "),
    ("η", " _eta_ "),
    ("θ", " _theta_ "),
    ("ι", " _iota_ "),
    ("κ", " _kappa_ "),
    ("λ", " _lambda_ "),
    ("μ", " _mu_ "),
    ("ν", " _nu_ "),
    ("ξ", " _xi_ "),
    ("ο", " _omicron_ "),
    ("π", " _pi_ "),
    ("ρ", " _rho_ "),
    ("σ", " _sigma_ "),
    ("τ", " _tau_ "),
    ("υ", " _upsilon_ "),
    ("φ", " _phi_ "),
    ("χ", " _chi_ "),
    ("ψ", " _psi_ "),
    ("ω", " _omega_ "),
    ("–", "-"),
    ("—", "-"),
    ("\u{0000}", " "),
    ("\u{001c}", " "),
    ("\u{001d}", " "),
    ("\u{0012}", " "),
    ("\u{0013}", " "),
    ("\u{200b}", " "),
    ("æ", "ae"),
    ("œ", "oe"),
    ("&", " and "),
    ("×", "x"),
    ("±", "+-"),
    ("‘", "'"),
    ("’", "'"),
    ("“", "\""),
    ("”", "\""),
    ("`", ""),
    ("´", ""),
    ("¨", ""),
    ("{", "("),
    ("}", ")"),
    ("[", "("),
    ("]", ")"),
];

/// Pharmacopeia codes, salt forms, dosage forms and routes of administration.
/// An empty replacement removes the token; a non-empty one expands the
/// abbreviation to its canonical spelling. Matched whole-word,
/// case-insensitive, longest pattern first.
pub(crate) const SUBSTANCE_ABBREVIATIONS: &[(&str, &str)] = &[
    // Salt forms and counter-ions
    ("hcl", "hydrochloride"),
    ("hbr", "hydrobromide"),
    ("hi", "hydroiodide"),
    ("sulfate", "sulfate"),
    ("sulphate", "sulfate"),
    ("mesylate", "methanesulfonate"),
    ("tosylate", "toluenesulfonate"),
    ("besylate", "benzenesulfonate"),
    ("esylate", "ethanesulfonate"),
    ("edta", "edetate"),
    ("na", "sodium"),
    ("k", "potassium"),
    ("ca", "calcium"),
    ("mg", "magnesium"),
    ("nh4", "ammonium"),
    ("tris", "tromethamine"),
    // Pharmacopeias, grades, standards
    ("usp", ""),
    ("nf", ""),
    ("bp", ""),
    ("jp", ""),
    ("ep", ""),
    ("ph eur", ""),
    ("eur ph", ""),
    ("dab", ""),
    ("ph helv", ""),
    ("int ph", ""),
    ("ph int", ""),
    ("ind", ""),
    ("fcc", ""),
    ("acs", ""),
    ("reagent grade", ""),
    ("reag", ""),
    ("technical grade", ""),
    ("tech", ""),
    ("analytical grade", ""),
    ("pa", ""),
    ("pure", ""),
    ("puriss", ""),
    // Hydration / solvation state
    ("anhyd", "anhydrous"),
    ("anhydr", "anhydrous"),
    ("mono hydrate", "monohydrate"),
    ("di hydrate", "dihydrate"),
    ("tri hydrate", "trihydrate"),
    ("hemi hydrate", "hemihydrate"),
    ("sesqui hydrate", "sesquihydrate"),
    ("etoh", "ethanolate"),
    ("meoh", "methanolate"),
    // Dosage forms, removed for substance-level comparison
    ("sr", ""),
    ("er", ""),
    ("xr", ""),
    ("xl", ""),
    ("dr", ""),
    ("ir", ""),
    ("odt", ""),
    ("tds", ""),
    ("td", ""),
    ("inj", ""),
    ("soln", ""),
    ("sol", ""),
    ("susp", ""),
    ("conc", ""),
    ("tab", ""),
    ("cap", ""),
    ("caps", ""),
    ("oint", ""),
    ("crm", ""),
    ("supp", ""),
    ("inh", ""),
    ("neb", ""),
    ("amp", ""),
    ("pfs", ""),
    ("mdi", ""),
    ("dpi", ""),
    ("gtt", ""),
    ("lot", ""),
    ("pwd", ""),
    ("powd", ""),
    ("gran", ""),
    ("chew", ""),
    ("eff", ""),
    // Routes of administration
    ("subling", ""),
    ("sl", ""),
    ("bucc", ""),
    ("iv", ""),
    ("im", ""),
    ("sc", ""),
    ("subcut", ""),
    ("po", ""),
    ("pr", ""),
    ("top", ""),
    // General chemical / biological qualifiers
    ("aq", "aqueous"),
    ("dil", "dilute"),
    ("sat", "saturated"),
    ("rec", "recombinant"),
    ("vet", "veterinary"),
];

/// Corporate and pharma-industry suffix words stripped from supplier names.
pub(crate) const SUPPLIER_SUFFIXES: &[&str] = &[
    // General legal forms
    "inc", "incorporated", "llc", "limited", "ltd", "corp", "corporation",
    "co", "company", "gmbh", "ag", "sa", "sarl", "srl", "plc", "bv", "nv",
    "lp", "llp", "oyj", "ab", "as", "asa", "spa", "pty", "group", "holding",
    "holdings", "sl", "pvt", "cts", "ltda", "div", "in", "de", "ch",
    // Pharma / bio specific
    "pharma", "pharmaceuticals", "pharmaceutical", "therapeutics",
    "biosciences", "bioscience", "biopharma", "biopharmaceutical", "biotech",
    "biotechnology", "diagnostics", "labotatories", "unit", "site", "joint",
    "stock", "private", "solutions", "solution", "plot", "labs",
    "laboratories", "health", "healthcare", "medical", "sciences",
];

/// Misspelling matchers, longest pattern first so longer patterns are not
/// shadowed by a shorter prefix.
pub(crate) static MISSPELLING_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    let mut entries: Vec<&(&str, &str)> = MISSPELLINGS.iter().collect();
    entries.sort_by_key(|(pattern, _)| std::cmp::Reverse(pattern.len()));
    entries
        .into_iter()
        .map(|(pattern, replacement)| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(pattern)))
                .expect("misspelling pattern must compile");
            (re, *replacement)
        })
        .collect()
});

/// One alternation over every abbreviation, longest first, so "ph eur" wins
/// over "ep" when both could match at the same position.
pub(crate) static SUBSTANCE_ABBREV_RE: Lazy<Regex> = Lazy::new(|| {
    let mut patterns: Vec<&str> = SUBSTANCE_ABBREVIATIONS.iter().map(|(p, _)| *p).collect();
    patterns.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let alternation = patterns
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b({})\b", alternation))
        .expect("abbreviation alternation must compile")
});

pub(crate) static SUBSTANCE_ABBREV_MAP: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    SUBSTANCE_ABBREVIATIONS
        .iter()
        .map(|(pattern, replacement)| (pattern.to_lowercase(), *replacement))
        .collect()
});

pub(crate) static SUPPLIER_SUFFIX_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| SUPPLIER_SUFFIXES.iter().copied().collect());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misspelling_patterns_compile_and_sort_longest_first() {
        let lens: Vec<usize> = MISSPELLING_PATTERNS
            .iter()
            .map(|(re, _)| re.as_str().len())
            .collect();
        assert!(lens.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn abbreviation_map_covers_every_table_entry() {
        assert_eq!(SUBSTANCE_ABBREV_MAP.len(), SUBSTANCE_ABBREVIATIONS.len());
        assert_eq!(SUBSTANCE_ABBREV_MAP.get("hcl"), Some(&"hydrochloride"));
        assert_eq!(SUBSTANCE_ABBREV_MAP.get("usp"), Some(&""));
    }

    #[test]
    fn multiword_abbreviation_wins_over_embedded_short_one() {
        // "ph eur" must be consumed as one unit, not leave "ph" + "eur".
        let caps = SUBSTANCE_ABBREV_RE.find("aspirin ph eur").unwrap();
        assert_eq!(caps.as_str(), "ph eur");
    }
}
