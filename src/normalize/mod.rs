// src/normalize/mod.rs
pub mod base;
pub mod memo;
pub mod substance;
pub mod supplier;
pub(crate) mod tables;

pub use base::normalize;
pub use memo::CleaningCache;
pub use substance::clean_substance_name;
pub use supplier::clean_supplier_name;

use crate::config::MappingKind;

/// The cleaning profile for a mapping kind. Merge mappings compare substance
/// names on both sides, so they share the substance profile.
pub fn profile_for(kind: MappingKind) -> fn(&str) -> String {
    match kind {
        MappingKind::Substance | MappingKind::Merge => clean_substance_name,
        MappingKind::Supplier => clean_supplier_name,
    }
}
