// src/models/mod.rs - Core data model for one matching run
use serde::Serialize;

/// A single free-text identifier (substance or supplier name) with its
/// derived attributes. `original` is the string as received from the
/// ingestion feed; `cleaned` is the profile-cleaned comparable form.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub original: String,
    pub cleaned: String,
    pub status_flag: bool,
    pub index: usize,
}

/// An ordered, deduplicated set of identifiers from one side of a mapping.
/// Indices are dense and stable for the lifetime of a run.
#[derive(Debug, Default)]
pub struct IdentifierCollection {
    items: Vec<Identifier>,
}

impl IdentifierCollection {
    pub fn new(items: Vec<Identifier>) -> Self {
        debug_assert!(items.iter().enumerate().all(|(i, id)| id.index == i));
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> &Identifier {
        &self.items[index]
    }

    pub fn original(&self, index: usize) -> &str {
        &self.items[index].original
    }

    pub fn cleaned(&self, index: usize) -> &str {
        &self.items[index].cleaned
    }

    pub fn status_flag(&self, index: usize) -> bool {
        self.items[index].status_flag
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.items.iter()
    }
}

/// An unverified proposed equivalence between one left-side and one
/// right-side identifier. `item_1`/`item_2` echo the original strings, which
/// is the payload shape the downstream semantic arbiter expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandidatePair {
    pub item_1: String,
    pub item_2: String,
    pub item_1_orig_index: usize,
    pub item_2_orig_index: usize,
}

/// Symmetric difference between the combined and original-only matching
/// strategies for one left item. Produced in analysis mode only.
#[derive(Debug, Clone)]
pub struct DiscrepancyRecord {
    pub source_index: usize,
    pub source_name: String,
    /// Right-side originals matched only by the combined (cleaned +
    /// original post-filter) approach.
    pub only_combined: Vec<String>,
    /// Right-side originals matched only by the original-strings pass.
    pub only_original: Vec<String>,
}

/// Aggregate counters for one matching run.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub items_processed: usize,
    pub items_skipped_empty: usize,
    pub items_failed: usize,
    pub candidates_emitted: usize,
    pub discrepancy_count: usize,
}
