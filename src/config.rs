// src/config.rs - Static registry of mapping run configurations
use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;

// Coarse pre-filter margin below the cleaned threshold. A generous margin
// keeps recall high while the cheap pass still prunes most of the grid.
const DEFAULT_PREFILTER_MARGIN: f64 = 15.0;

/// What kind of identifiers a mapping compares. Merge mappings join two
/// already-arbitrated mappings and reuse the substance cleaning profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    Substance,
    Supplier,
    Merge,
}

impl MappingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingKind::Substance => "Substance",
            MappingKind::Supplier => "Supplier",
            MappingKind::Merge => "Merge",
        }
    }
}

/// One side of a mapping: which CSV file to read and how to pull identifier
/// values out of it.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub filename: &'static str,
    pub column: &'static str,
    pub prefix: &'static str,
    /// Some feeds pack several values into one cell. When set, cells are
    /// split on this separator (and on `|`) during ingestion.
    pub separator: Option<&'static str>,
}

/// Full configuration for one named mapping run.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub mapping_name: &'static str,
    pub kind: MappingKind,
    pub source_1: SourceSpec,
    pub source_2: SourceSpec,
    /// Acceptance threshold for scorers running on original strings.
    pub original_threshold: f64,
    /// Acceptance threshold for scorers running on cleaned strings.
    pub cleaned_threshold: f64,
    pub prefilter_margin: f64,
    /// How many candidate pairs go into a single arbiter request.
    pub request_item_size: usize,
    /// How many requests go into a single arbiter batch file.
    pub batch_size: usize,
}

impl MappingConfig {
    pub fn candidates_filename(&self) -> String {
        format!("{}_candidates_combined.csv", self.mapping_name)
    }

    pub fn mapping_output_filename(&self) -> String {
        format!("{}_mapping.csv", self.mapping_name)
    }

    pub fn batches_dir(&self) -> String {
        format!("{}/batches", self.mapping_name)
    }
}

pub static POSSIBLE_MAPPINGS: Lazy<Vec<MappingConfig>> = Lazy::new(|| {
    vec![
        MappingConfig {
            mapping_name: "substance_orange_book_to_usdmf",
            kind: MappingKind::Substance,
            source_1: SourceSpec {
                filename: "ob_cleaned.csv",
                column: "Ingredient",
                prefix: "OB",
                separator: None,
            },
            source_2: SourceSpec {
                filename: "usdmf_cleaned.csv",
                column: "SUBJECT",
                prefix: "US_DMF",
                separator: None,
            },
            original_threshold: 70.0,
            cleaned_threshold: 80.0,
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            request_item_size: 100,
            batch_size: 5000,
        },
        MappingConfig {
            mapping_name: "substance_a57_to_cep",
            kind: MappingKind::Substance,
            source_1: SourceSpec {
                filename: "a57_cleaned.csv",
                column: "Active_substance",
                prefix: "A57",
                separator: None,
            },
            source_2: SourceSpec {
                filename: "cep_cleaned.csv",
                column: "englishName",
                prefix: "CEP",
                separator: None,
            },
            original_threshold: 70.0,
            cleaned_threshold: 80.0,
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            request_item_size: 100,
            batch_size: 5000,
        },
        MappingConfig {
            mapping_name: "substance_public_manufacturer_to_qf",
            kind: MappingKind::Substance,
            source_1: SourceSpec {
                filename: "public_manufacturer_required_apis.csv",
                column: "manufacturer_required_api",
                prefix: "PUBLIC",
                separator: None,
            },
            source_2: SourceSpec {
                filename: "qf_supplier_sites_products_cleaned.csv",
                column: "qf_supplier_site_audited_requested_product",
                prefix: "QF",
                separator: None,
            },
            original_threshold: 70.0,
            cleaned_threshold: 80.0,
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            request_item_size: 50,
            batch_size: 5000,
        },
        MappingConfig {
            mapping_name: "supplier_public_to_qf",
            kind: MappingKind::Supplier,
            source_1: SourceSpec {
                filename: "public_supplier_names.csv",
                column: "supplier_name",
                prefix: "PUBLIC",
                separator: None,
            },
            source_2: SourceSpec {
                filename: "qf_supplier_sites_names_cleaned.csv",
                column: "qf_supplier_site_name",
                prefix: "QF",
                separator: None,
            },
            original_threshold: 50.0,
            cleaned_threshold: 50.0,
            prefilter_margin: DEFAULT_PREFILTER_MARGIN,
            request_item_size: 100,
            batch_size: 5000,
        },
    ]
});

/// Look up a mapping by name. An unknown name is a fatal setup error, not
/// something to recover from.
pub fn get_mapping_config(mapping_name: &str) -> Result<&'static MappingConfig> {
    POSSIBLE_MAPPINGS
        .iter()
        .find(|m| m.mapping_name == mapping_name)
        .ok_or_else(|| {
            let known: Vec<&str> = POSSIBLE_MAPPINGS.iter().map(|m| m.mapping_name).collect();
            anyhow!(
                "Unknown mapping '{}'. Known mappings: {}",
                mapping_name,
                known.join(", ")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_name() {
        let config = get_mapping_config("substance_orange_book_to_usdmf").unwrap();
        assert_eq!(config.kind, MappingKind::Substance);
        assert_eq!(config.cleaned_threshold, 80.0);
        assert_eq!(config.original_threshold, 70.0);
    }

    #[test]
    fn supplier_mapping_uses_symmetric_thresholds() {
        let config = get_mapping_config("supplier_public_to_qf").unwrap();
        assert_eq!(config.kind, MappingKind::Supplier);
        assert_eq!(config.original_threshold, config.cleaned_threshold);
    }

    #[test]
    fn unknown_mapping_is_an_error() {
        let err = get_mapping_config("no_such_mapping").unwrap_err();
        assert!(err.to_string().contains("Unknown mapping"));
    }

    #[test]
    fn output_filenames_are_mapping_scoped() {
        let config = get_mapping_config("substance_a57_to_cep").unwrap();
        assert_eq!(
            config.candidates_filename(),
            "substance_a57_to_cep_candidates_combined.csv"
        );
        assert_eq!(
            config.mapping_output_filename(),
            "substance_a57_to_cep_mapping.csv"
        );
    }
}
