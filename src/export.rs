// src/export.rs - CSV outputs: candidate pairs and arbitrated final mappings
use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::arbiter::VerdictSet;
use crate::config::MappingConfig;
use crate::models::CandidatePair;
use crate::normalize::normalize;

const OUTPUT_DIR: &str = "outputs";

fn output_path(filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(OUTPUT_DIR).context("Failed to create outputs directory")?;
    Ok(Path::new(OUTPUT_DIR).join(filename))
}

/// Write the combined-approach candidate pairs, the file the arbiter
/// request generator and the recap both work from.
pub fn export_candidates(candidates: &[CandidatePair], config: &MappingConfig) -> Result<PathBuf> {
    let path = output_path(&config.candidates_filename())?;
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for pair in candidates {
        writer.serialize(pair)?;
    }
    writer.flush()?;
    info!("💾 Saved {} candidates to {}", candidates.len(), path.display());
    Ok(path)
}

/// Write the final mapping: arbiter-accepted verdicts only, with the
/// original and re-normalized forms side by side so downstream joins can
/// use either. Column names carry the source prefixes from the config.
pub fn export_final_mapping(verdicts: &VerdictSet, config: &MappingConfig) -> Result<PathBuf> {
    let path = output_path(&config.mapping_output_filename())?;
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let prefix_1 = config.source_1.prefix;
    let prefix_2 = config.source_2.prefix;

    let accepted = match verdicts {
        VerdictSet::Substance(verdicts) => {
            writer.write_record([
                format!("{}_mapped_substance", prefix_1),
                format!("{}_mapped_substance_cleaned", prefix_1),
                format!("{}_mapped_substance", prefix_2),
                format!("{}_mapped_substance_cleaned", prefix_2),
                "have_same_base".to_string(),
                "have_same_form".to_string(),
                "is_diluted".to_string(),
            ])?;
            let mut written = 0;
            for verdict in verdicts.iter().filter(|v| v.is_accepted()) {
                writer.write_record([
                    verdict.active_substance_1.clone(),
                    normalize(&verdict.active_substance_1),
                    verdict.active_substance_2.clone(),
                    normalize(&verdict.active_substance_2),
                    verdict.have_same_base.to_string(),
                    verdict.have_same_form.to_string(),
                    verdict.is_diluted.to_string(),
                ])?;
                written += 1;
            }
            written
        }
        VerdictSet::Supplier(verdicts) => {
            writer.write_record([
                format!("{}_mapped_supplier", prefix_1),
                format!("{}_mapped_supplier_cleaned", prefix_1),
                format!("{}_is_supplier_site", prefix_1),
                format!("{}_mapped_supplier", prefix_2),
                format!("{}_mapped_supplier_cleaned", prefix_2),
                format!("{}_is_supplier_site", prefix_2),
                "confidence_score_match_site_level".to_string(),
                "confidence_score_are_part_of_same_company".to_string(),
            ])?;
            let mut written = 0;
            for verdict in verdicts.iter().filter(|v| v.is_accepted()) {
                writer.write_record([
                    verdict.item_1.clone(),
                    normalize(&verdict.item_1),
                    verdict.is_item_1_supplier_site.to_string(),
                    verdict.item_2.clone(),
                    normalize(&verdict.item_2),
                    verdict.is_item_2_supplier_site.to_string(),
                    verdict.confidence_score_match_site_level.to_string(),
                    verdict.confidence_score_are_part_of_same_company.to_string(),
                ])?;
                written += 1;
            }
            written
        }
    };
    writer.flush()?;
    info!("💾 Saved {} accepted mappings to {}", accepted, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::SubstanceVerdict;
    use crate::config::get_mapping_config;
    use std::sync::Mutex;

    // Both tests chdir into a scratch directory; current_dir is process
    // global, so they must not overlap.
    static CWD_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn candidates_csv_round_trips_through_headers() -> Result<()> {
        let _guard = CWD_LOCK.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("export-test-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(&dir)?;

        let config = get_mapping_config("substance_a57_to_cep").unwrap();
        let candidates = vec![CandidatePair {
            item_1: "AMIODARONE HYDROCHLORIDE".into(),
            item_2: "AMIODARONE HCL USP".into(),
            item_1_orig_index: 0,
            item_2_orig_index: 3,
        }];
        let path = export_candidates(&candidates, config)?;
        let contents = fs::read_to_string(&path)?;
        assert!(contents.starts_with("item_1,item_2,item_1_orig_index,item_2_orig_index"));
        assert!(contents.contains("AMIODARONE HCL USP"));

        std::env::set_current_dir(previous)?;
        fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn final_mapping_keeps_accepted_verdicts_only() -> Result<()> {
        let _guard = CWD_LOCK.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("export-test-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir)?;
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(&dir)?;

        let config = get_mapping_config("substance_a57_to_cep").unwrap();
        let verdicts = VerdictSet::Substance(vec![
            SubstanceVerdict {
                active_substance_1: "NAPROXEN SODIUM".into(),
                active_substance_2: "Naproxen Na".into(),
                have_same_base: true,
                have_same_form: true,
                is_diluted: false,
            },
            SubstanceVerdict {
                active_substance_1: "NAPROXEN SODIUM".into(),
                active_substance_2: "Ibuprofen".into(),
                have_same_base: false,
                have_same_form: false,
                is_diluted: false,
            },
        ]);
        let path = export_final_mapping(&verdicts, config)?;
        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains("A57_mapped_substance"));
        assert!(contents.contains("Naproxen Na"));
        assert!(!contents.contains("Ibuprofen"));

        std::env::set_current_dir(previous)?;
        fs::remove_dir_all(dir)?;
        Ok(())
    }
}
