// src/matching/matcher.rs - Two-phase combined approximate match for one left item
use std::collections::BTreeSet;

use crate::config::MappingConfig;
use crate::matching::prefilter::StatusPartition;
use crate::matching::scorers::{any_meets, token_set_ratio, SCORERS_CLEANED, SCORERS_ORIGINAL};
use crate::models::{DiscrepancyRecord, Identifier, IdentifierCollection};

/// The result of matching one left item: accepted right-side indices, plus
/// (in analysis mode) the discrepancy against the original-strings-only
/// strategy when one exists. The combined candidates are authoritative.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub candidates: BTreeSet<usize>,
    pub discrepancy: Option<DiscrepancyRecord>,
}

/// Match one left item against the status-compatible subset of the right
/// collection. Pure CPU-bound scoring; never fails.
///
/// An empty cleaned left string short-circuits the combined strategy only;
/// the original-strings pass needs no cleaning and still runs in analysis
/// mode, so its matches surface in the discrepancy record.
pub fn match_left_item(
    left: &Identifier,
    right: &IdentifierCollection,
    partition: &StatusPartition,
    config: &MappingConfig,
    analyze: bool,
) -> MatchOutcome {
    let subset = partition.indices_for(left.status_flag);
    if subset.is_empty() {
        return MatchOutcome::default();
    }

    let candidates = if left.cleaned.trim().is_empty() {
        BTreeSet::new()
    } else {
        combined_matches(left, right, subset, config)
    };
    if !analyze {
        return MatchOutcome {
            candidates,
            discrepancy: None,
        };
    }

    let original_only = original_only_matches(left, right, subset, config);
    let discrepancy = build_discrepancy(left, right, &candidates, &original_only);
    MatchOutcome {
        candidates,
        discrepancy,
    }
}

/// The production strategy. Phase 1 is a cheap token-set pass at a cutoff
/// below the real threshold, so pairs the full ensemble would still accept
/// are not discarded early. Phase 2 is the cleaned-string ensemble. Phase 3
/// post-filters against the original strings, with a first-token fallback
/// biased toward recall; the downstream arbiter rejects false positives.
fn combined_matches(
    left: &Identifier,
    right: &IdentifierCollection,
    subset: &[usize],
    config: &MappingConfig,
) -> BTreeSet<usize> {
    let cutoff = (config.cleaned_threshold - config.prefilter_margin).max(1.0);
    let left_original_folded = left.original.to_lowercase();

    let mut accepted = BTreeSet::new();
    for &idx in subset {
        let right_cleaned = right.cleaned(idx);
        if right_cleaned.trim().is_empty() {
            continue;
        }
        if token_set_ratio(&left.cleaned, right_cleaned) < cutoff {
            continue;
        }
        if !any_meets(
            &SCORERS_CLEANED,
            &left.cleaned,
            right_cleaned,
            config.cleaned_threshold,
        ) {
            continue;
        }

        let right_original_folded = right.original(idx).to_lowercase();
        let post_filter_ok = any_meets(
            &SCORERS_ORIGINAL,
            &left_original_folded,
            &right_original_folded,
            config.original_threshold,
        ) || first_tokens_equal(&left.cleaned, right_cleaned);

        if post_filter_ok {
            accepted.insert(idx);
        }
    }
    accepted
}

/// The analysis-only alternate strategy: the four-member ensemble applied
/// directly to raw original strings, no cleaning involved.
fn original_only_matches(
    left: &Identifier,
    right: &IdentifierCollection,
    subset: &[usize],
    config: &MappingConfig,
) -> BTreeSet<usize> {
    let cutoff = (config.original_threshold - config.prefilter_margin).max(1.0);

    let mut accepted = BTreeSet::new();
    for &idx in subset {
        let right_original = right.original(idx);
        if token_set_ratio(&left.original, right_original) < cutoff {
            continue;
        }
        if any_meets(
            &SCORERS_ORIGINAL,
            &left.original,
            right_original,
            config.original_threshold,
        ) {
            accepted.insert(idx);
        }
    }
    accepted
}

/// Rescues true matches whose trailing qualifiers differ enough to fail
/// ensemble scoring but whose leading substance or company token is equal.
fn first_tokens_equal(cleaned_1: &str, cleaned_2: &str) -> bool {
    match (
        cleaned_1.split_whitespace().next(),
        cleaned_2.split_whitespace().next(),
    ) {
        (Some(t1), Some(t2)) => t1.eq_ignore_ascii_case(t2),
        _ => false,
    }
}

fn build_discrepancy(
    left: &Identifier,
    right: &IdentifierCollection,
    combined: &BTreeSet<usize>,
    original_only: &BTreeSet<usize>,
) -> Option<DiscrepancyRecord> {
    let only_combined: Vec<String> = combined
        .difference(original_only)
        .map(|&idx| right.original(idx).to_string())
        .collect();
    let only_original: Vec<String> = original_only
        .difference(combined)
        .map(|&idx| right.original(idx).to_string())
        .collect();

    if only_combined.is_empty() && only_original.is_empty() {
        return None;
    }
    Some(DiscrepancyRecord {
        source_index: left.index,
        source_name: left.original.clone(),
        only_combined,
        only_original,
    })
}
