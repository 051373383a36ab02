// src/matching/mod.rs
pub mod discrepancy;
pub mod matcher;
pub mod orchestrator;
pub mod prefilter;
pub mod scorers;

pub use matcher::{match_left_item, MatchOutcome};
pub use orchestrator::{run_matching, RunOutput};
pub use prefilter::{status_flag_for, StatusPartition};
