// src/matching/prefilter.rs - Status partition of the right-side collection
use crate::config::MappingKind;
use crate::models::IdentifierCollection;

/// Cleaned names containing this keyword flag an intermediate compound
/// rather than a finished substance.
pub const INTERMEDIATE_KEYWORD: &str = "intermediate";

pub fn status_flag_for(cleaned: &str, kind: MappingKind) -> bool {
    matches!(kind, MappingKind::Substance | MappingKind::Merge) && cleaned.contains(INTERMEDIATE_KEYWORD)
}

/// The right-side collection split once by status flag, so each left item
/// compares only against compatible-status indices. For non-substance
/// mappings both buckets hold the full index range.
pub struct StatusPartition {
    flagged: Vec<usize>,
    unflagged: Vec<usize>,
    partitioned: bool,
}

impl StatusPartition {
    pub fn new(right: &IdentifierCollection, kind: MappingKind) -> Self {
        let partitioned = matches!(kind, MappingKind::Substance | MappingKind::Merge);
        if !partitioned {
            let all: Vec<usize> = (0..right.len()).collect();
            return Self {
                flagged: all.clone(),
                unflagged: all,
                partitioned,
            };
        }

        let mut flagged = Vec::new();
        let mut unflagged = Vec::new();
        for item in right.iter() {
            if item.status_flag {
                flagged.push(item.index);
            } else {
                unflagged.push(item.index);
            }
        }
        Self {
            flagged,
            unflagged,
            partitioned,
        }
    }

    /// Right-side indices a left item with this status flag may match. An
    /// empty slice is a legitimate outcome, not an error.
    pub fn indices_for(&self, status_flag: bool) -> &[usize] {
        if status_flag {
            &self.flagged
        } else {
            &self.unflagged
        }
    }

    pub fn is_partitioned(&self) -> bool {
        self.partitioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identifier;

    fn collection(items: &[(&str, bool)]) -> IdentifierCollection {
        IdentifierCollection::new(
            items
                .iter()
                .enumerate()
                .map(|(i, (name, flag))| Identifier {
                    original: name.to_string(),
                    cleaned: name.to_lowercase(),
                    status_flag: *flag,
                    index: i,
                })
                .collect(),
        )
    }

    #[test]
    fn substance_partition_splits_by_flag() {
        let right = collection(&[
            ("Aspirin", false),
            ("Aspirin intermediate", true),
            ("Urea", false),
        ]);
        let partition = StatusPartition::new(&right, MappingKind::Substance);
        assert_eq!(partition.indices_for(false), &[0, 2]);
        assert_eq!(partition.indices_for(true), &[1]);
        assert!(partition.is_partitioned());
    }

    #[test]
    fn supplier_partition_returns_everything() {
        let right = collection(&[("Pfizer", false), ("Bayer", true)]);
        let partition = StatusPartition::new(&right, MappingKind::Supplier);
        assert_eq!(partition.indices_for(false), &[0, 1]);
        assert_eq!(partition.indices_for(true), &[0, 1]);
        assert!(!partition.is_partitioned());
    }

    #[test]
    fn empty_bucket_is_a_legitimate_outcome() {
        let right = collection(&[("Aspirin", false)]);
        let partition = StatusPartition::new(&right, MappingKind::Substance);
        assert!(partition.indices_for(true).is_empty());
    }

    #[test]
    fn status_flag_is_keyword_containment_for_substances_only() {
        assert!(status_flag_for("aspirin intermediate grade", MappingKind::Substance));
        assert!(!status_flag_for("aspirin", MappingKind::Substance));
        assert!(!status_flag_for("intermediate holdings", MappingKind::Supplier));
    }
}
