// src/matching/discrepancy.rs - Recap of combined vs original-only strategy differences
use log::info;

use crate::models::DiscrepancyRecord;

/// Log a readable recap of every left item where the two matching
/// strategies disagreed. Records are sorted by source index; the combined
/// strategy's candidates remain the authoritative output either way.
pub fn log_discrepancy_recap(discrepancies: &[DiscrepancyRecord]) {
    if discrepancies.is_empty() {
        info!("No discrepancies found between the original-only and combined matching approaches.");
        return;
    }

    let mut sorted: Vec<&DiscrepancyRecord> = discrepancies.iter().collect();
    sorted.sort_by_key(|record| record.source_index);

    info!(
        "{} DISCREPANCY RECAP (original-only vs combined) {}",
        "=".repeat(20),
        "=".repeat(20)
    );
    info!(
        "Found {} left items where the two matching approaches yielded different results.",
        sorted.len()
    );
    for (case, record) in sorted.iter().enumerate() {
        info!("--- Case {}/{} ---", case + 1, sorted.len());
        info!(
            "Left (idx {}): '{}'",
            record.source_index, record.source_name
        );
        if !record.only_combined.is_empty() {
            info!("  -> Matched ONLY via combined (cleaned + original post-filter):");
            for item in &record.only_combined {
                info!("       - {}", item);
            }
        }
        if !record.only_original.is_empty() {
            info!("  -> Matched ONLY via original-only:");
            for item in &record.only_original {
                info!("       - {}", item);
            }
        }
    }
    info!("{}", "=".repeat(68));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recap_tolerates_empty_and_populated_input() {
        log_discrepancy_recap(&[]);
        log_discrepancy_recap(&[DiscrepancyRecord {
            source_index: 3,
            source_name: "ASPIRIN".to_string(),
            only_combined: vec!["ASPIRIN USP".to_string()],
            only_original: vec![],
        }]);
    }
}
