// src/ingest.rs - CSV ingestion: raw feed rows to a normalized identifier collection
use anyhow::{bail, Context, Result};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::{MappingKind, SourceSpec};
use crate::matching::status_flag_for;
use crate::models::{Identifier, IdentifierCollection};
use crate::normalize::{normalize, profile_for, CleaningCache};

static PARENTHETICAL_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((.*?)\)").expect("static regex"));

/// Load one side of a mapping: read its CSV, split multi-value cells, base
/// normalize, drop empties and deduplicate preserving first-seen order.
pub fn load_source_names(spec: &SourceSpec) -> Result<Vec<String>> {
    let path = resolve_input_path(spec.filename)?;
    info!("📥 Loading {} (column '{}')", path.display(), spec.column);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read headers from {}", path.display()))?;
    let column_index = headers
        .iter()
        .position(|h| h == spec.column)
        .with_context(|| {
            format!(
                "Column '{}' not found in {} (headers: {})",
                spec.column,
                path.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    let item_boundary = spec
        .separator
        .map(|sep| {
            Regex::new(&format!(r"{}\s+", regex::escape(sep)))
                .context("Separator must escape to a valid regex")
        })
        .transpose()?;

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for record in reader.records() {
        let record =
            record.with_context(|| format!("Failed to read record from {}", path.display()))?;
        let Some(cell) = record.get(column_index) else {
            continue;
        };
        for value in split_cell(cell, spec.separator, item_boundary.as_ref()) {
            let normalized = normalize(&value);
            if normalized.is_empty() {
                continue;
            }
            if seen.insert(normalized.clone()) {
                names.push(normalized);
            }
        }
    }

    info!(
        "   • {} unique normalized values from {}",
        names.len(),
        spec.filename
    );
    Ok(names)
}

/// Input files normally live under inputs/; outputs/ is checked second so a
/// mapping can chain on another mapping's result.
fn resolve_input_path(filename: &str) -> Result<PathBuf> {
    for dir in ["inputs", "outputs"] {
        let candidate = Path::new(dir).join(filename);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    bail!("Input file '{}' not found under inputs/ or outputs/", filename)
}

/// Split a multi-value cell. Separators inside parentheses belong to the
/// value ("Aspirin (tabs, caps)" is one item), so they are removed before
/// the cell is split on `|` and on the `<separator><spaces>` boundary.
fn split_cell(cell: &str, separator: Option<&str>, item_boundary: Option<&Regex>) -> Vec<String> {
    let (Some(separator), Some(item_boundary)) = (separator, item_boundary) else {
        return vec![cell.to_string()];
    };

    let shielded = PARENTHETICAL_CONTENT.replace_all(cell, |caps: &regex::Captures| {
        format!("({})", caps[1].replace(separator, "").replace('|', ""))
    });

    let mut items = Vec::new();
    for segment in shielded.split('|') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        for item in item_boundary.split(segment) {
            let item = item.trim();
            if !item.is_empty() {
                items.push(item.to_string());
            }
        }
    }
    items
}

/// Attach cleaned forms and status flags, producing the dense-indexed
/// collection the matcher consumes.
pub fn build_collection(
    names: Vec<String>,
    kind: MappingKind,
    cache: &mut CleaningCache,
) -> IdentifierCollection {
    let clean_fn = profile_for(kind);
    let items = names
        .into_iter()
        .enumerate()
        .map(|(index, original)| {
            let cleaned = cache.get_or_clean(&original, clean_fn);
            let status_flag = status_flag_for(&cleaned, kind);
            Identifier {
                original,
                cleaned,
                status_flag,
                index,
            }
        })
        .collect();
    IdentifierCollection::new(items)
}

pub fn load_collection(
    spec: &SourceSpec,
    kind: MappingKind,
    cache: &mut CleaningCache,
) -> Result<IdentifierCollection> {
    let names = load_source_names(spec)?;
    Ok(build_collection(names, kind, cache))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_on_comma(cell: &str) -> Vec<String> {
        let boundary = Regex::new(r",\s+").unwrap();
        split_cell(cell, Some(","), Some(&boundary))
    }

    #[test]
    fn cell_without_separator_is_one_item() {
        assert_eq!(split_cell("Aspirin, caps", None, None), vec!["Aspirin, caps"]);
    }

    #[test]
    fn cell_splits_on_pipe_and_separator() {
        let items = split_on_comma("Aspirin,  Ibuprofen | Naproxen");
        assert_eq!(items, vec!["Aspirin", "Ibuprofen", "Naproxen"]);
    }

    #[test]
    fn separators_inside_parentheses_do_not_split() {
        let items = split_on_comma("Aspirin (tabs, caps), Ibuprofen");
        assert_eq!(items, vec!["Aspirin (tabs caps)", "Ibuprofen"]);
    }

    #[test]
    fn separator_without_trailing_space_does_not_split() {
        // "1,2-diol" style chemical names survive a comma separator.
        let items = split_on_comma("Butane-1,2-diol, Aspirin");
        assert_eq!(items, vec!["Butane-1,2-diol", "Aspirin"]);
    }

    #[test]
    fn collection_carries_cleaned_forms_and_flags() {
        let mut cache = CleaningCache::new();
        let names = vec![
            "AMIODARONE HCL".to_string(),
            "ASPIRIN INTERMEDIATE".to_string(),
        ];
        let coll = build_collection(names, MappingKind::Substance, &mut cache);
        assert_eq!(coll.cleaned(0), "amiodarone hydrochloride");
        assert!(!coll.status_flag(0));
        assert!(coll.status_flag(1));
    }

    #[test]
    fn repeated_names_hit_the_cleaning_cache() {
        let mut cache = CleaningCache::new();
        let names: Vec<String> = vec!["ASPIRIN".to_string(); 1];
        build_collection(names, MappingKind::Substance, &mut cache);
        build_collection(vec!["ASPIRIN".to_string()], MappingKind::Substance, &mut cache);
        assert_eq!(cache.hits, 1);
    }
}
