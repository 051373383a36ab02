// src/main.rs - Pharmaceutical identifier mapping CLI
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

use mapping_lib::arbiter;
use mapping_lib::config::get_mapping_config;
use mapping_lib::export;
use mapping_lib::ingest;
use mapping_lib::matching::discrepancy::log_discrepancy_recap;
use mapping_lib::matching::run_matching;
use mapping_lib::normalize::CleaningCache;
use mapping_lib::utils::env::load_env;

/// A candidate-resolution tool for pharmaceutical identifier mappings.
#[derive(Parser, Debug)]
#[command(name = "mapper", version, about)]
struct Cli {
    /// Name of the mapping to execute (see the mapping registry).
    mapping_name: String,

    /// Number of parallel match workers.
    #[arg(long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Run matching and generate arbiter request batches.
    #[arg(short = 'g', long)]
    generate: bool,

    /// Process retrieved arbiter verdicts into the final mapping.
    #[arg(short = 'p', long)]
    process: bool,

    /// Also run the original-strings-only strategy and report discrepancies.
    #[arg(long)]
    analyze: bool,

    /// Run matching without writing arbiter request files.
    #[arg(short = 'd', long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();

    let cli = Cli::parse();
    let config = get_mapping_config(&cli.mapping_name)?;
    info!(
        "Starting mapping '{}' (kind: {}, thresholds: original {} / cleaned {})",
        config.mapping_name,
        config.kind.as_str(),
        config.original_threshold,
        config.cleaned_threshold
    );

    let start_time = Instant::now();

    if cli.generate {
        let ingest_start = Instant::now();
        let mut cache = CleaningCache::new();
        let left = Arc::new(
            ingest::load_collection(&config.source_1, config.kind, &mut cache)
                .context("Failed to load source 1")?,
        );
        let right = Arc::new(
            ingest::load_collection(&config.source_2, config.kind, &mut cache)
                .context("Failed to load source 2")?,
        );
        cache.log_final_stats();
        let ingest_duration = ingest_start.elapsed();
        info!(
            "Potential comparisons: {}",
            left.len() as u64 * right.len() as u64
        );

        let matching_start = Instant::now();
        let output = run_matching(
            left,
            right,
            Arc::new(config.clone()),
            cli.workers,
            cli.analyze,
        )
        .await
        .context("Matching run failed")?;
        let matching_duration = matching_start.elapsed();

        if cli.analyze {
            log_discrepancy_recap(&output.discrepancies);
        }

        export::export_candidates(&output.candidates, config)?;
        let batch_folder = arbiter::generate_requests(&output.candidates, config, cli.dry_run)?;

        info!("=== Run Summary ===");
        info!("Mapping: {}", config.mapping_name);
        info!("Items processed: {}", output.stats.items_processed);
        info!("Items skipped (empty): {}", output.stats.items_skipped_empty);
        info!("Items failed: {}", output.stats.items_failed);
        info!("Candidates emitted: {}", output.stats.candidates_emitted);
        if cli.analyze {
            info!("Discrepancy cases: {}", output.stats.discrepancy_count);
        }
        info!("Batch folder: {}", batch_folder.display());
        info!("=== Timing Breakdown ===");
        info!("Ingestion: {:.2?}", ingest_duration);
        info!("Matching: {:.2?}", matching_duration);
        info!("Total execution time: {:.2?}", start_time.elapsed());
    }

    if cli.process {
        let verdicts = arbiter::load_latest_verdicts(config)
            .context("Failed to load arbiter verdicts")?;
        let path = export::export_final_mapping(&verdicts, config)?;
        info!(
            "Final mapping written to {} in {:.2?}",
            path.display(),
            start_time.elapsed()
        );
    }

    if !cli.generate && !cli.process {
        warn!("Nothing to do: pass --generate and/or --process");
    }

    info!("Mapping run completed successfully!");
    Ok(())
}
