// src/matching/orchestrator.rs - Fan-out of match tasks over a bounded worker pool
use anyhow::{Context, Result};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::config::MappingConfig;
use crate::matching::matcher::{match_left_item, MatchOutcome};
use crate::matching::prefilter::StatusPartition;
use crate::models::{CandidatePair, DiscrepancyRecord, IdentifierCollection, RunStats};

// Progress is also logged textually so non-TTY runs stay observable.
const PROGRESS_LOG_EVERY: usize = 1000;

/// Everything a matching run produces. Candidates are sorted by
/// (left index, right index); discrepancies by left index.
#[derive(Debug)]
pub struct RunOutput {
    pub candidates: Vec<CandidatePair>,
    pub discrepancies: Vec<DiscrepancyRecord>,
    pub stats: RunStats,
}

/// Run the full left-against-right match: one task per left item, bounded
/// by `worker_count` permits, shared read-only views of the right
/// collection and configuration. A panicking task degrades to zero
/// candidates for its item; siblings are unaffected.
pub async fn run_matching(
    left: Arc<IdentifierCollection>,
    right: Arc<IdentifierCollection>,
    config: Arc<MappingConfig>,
    worker_count: usize,
    analyze: bool,
) -> Result<RunOutput> {
    let start_time = Instant::now();
    let partition = Arc::new(StatusPartition::new(&right, config.kind));

    info!(
        "🚀 Matching {} left items against {} right items ({} workers, analyze: {})",
        left.len(),
        right.len(),
        worker_count,
        analyze
    );
    if partition.is_partitioned() {
        info!(
            "   • status partition: {} flagged / {} unflagged right items",
            partition.indices_for(true).len(),
            partition.indices_for(false).len()
        );
    }

    let pb = ProgressBar::new(left.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.blue} [{elapsed_precise}] {bar:30.green/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    pb.set_message("Matching...");

    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let completed = Arc::new(AtomicUsize::new(0));
    let total = left.len();
    let mut tasks: Vec<JoinHandle<Result<(usize, MatchOutcome)>>> =
        Vec::with_capacity(left.len());
    for index in 0..left.len() {
        let left = Arc::clone(&left);
        let right = Arc::clone(&right);
        let config = Arc::clone(&config);
        let partition = Arc::clone(&partition);
        let semaphore = Arc::clone(&semaphore);
        let completed = Arc::clone(&completed);
        let pb = pb.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("Failed to acquire semaphore permit")?;
            let outcome = match_left_item(left.get(index), &right, &partition, &config, analyze);
            // Progress ticks as each task finishes, not when results are
            // collected, so long runs stay observable while still in flight.
            pb.inc(1);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % PROGRESS_LOG_EVERY == 0 {
                let rate = done as f64 / start_time.elapsed().as_secs_f64().max(0.001);
                info!("⏳ {}/{} items matched ({:.0} items/s)", done, total, rate);
            }
            Ok((index, outcome))
        }));
    }

    let (mut outcomes, mut stats) = collect_outcomes(tasks, &left).await;
    pb.finish_with_message("Matching complete");

    outcomes.sort_by_key(|(index, _)| *index);

    let mut candidates = Vec::new();
    let mut discrepancies = Vec::new();
    for (index, outcome) in outcomes {
        for right_index in &outcome.candidates {
            candidates.push(CandidatePair {
                item_1: left.original(index).to_string(),
                item_2: right.original(*right_index).to_string(),
                item_1_orig_index: index,
                item_2_orig_index: *right_index,
            });
        }
        if let Some(record) = outcome.discrepancy {
            discrepancies.push(record);
        }
    }
    stats.candidates_emitted = candidates.len();
    stats.discrepancy_count = discrepancies.len();

    info!(
        "✅ Matching complete in {:.2}s: {} candidates, {} discrepancies, {} failed items",
        start_time.elapsed().as_secs_f64(),
        stats.candidates_emitted,
        stats.discrepancy_count,
        stats.items_failed
    );

    Ok(RunOutput {
        candidates,
        discrepancies,
        stats,
    })
}

/// Await every spawned task and fold the join results into outcomes and
/// run stats. A task that panicked or failed counts toward `items_failed`
/// and contributes zero candidates; its siblings are unaffected.
async fn collect_outcomes(
    tasks: Vec<JoinHandle<Result<(usize, MatchOutcome)>>>,
    left: &IdentifierCollection,
) -> (Vec<(usize, MatchOutcome)>, RunStats) {
    let mut stats = RunStats::default();
    let mut outcomes: Vec<(usize, MatchOutcome)> = Vec::with_capacity(tasks.len());
    for (task_number, join_result) in join_all(tasks).await.into_iter().enumerate() {
        match join_result {
            Ok(Ok((index, outcome))) => {
                stats.items_processed += 1;
                if left.cleaned(index).trim().is_empty() {
                    stats.items_skipped_empty += 1;
                }
                outcomes.push((index, outcome));
            }
            Ok(Err(e)) => {
                stats.items_failed += 1;
                error!("❌ Match task {} failed: {:?}", task_number, e);
            }
            Err(e) => {
                stats.items_failed += 1;
                error!(
                    "💥 Match task for '{}' panicked: {:?}",
                    left.original(task_number),
                    e
                );
            }
        }
    }
    (outcomes, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{get_mapping_config, MappingKind};
    use crate::matching::prefilter::status_flag_for;
    use crate::models::Identifier;
    use crate::normalize::{clean_substance_name, normalize};

    fn substance_collection(raws: &[&str]) -> Arc<IdentifierCollection> {
        Arc::new(IdentifierCollection::new(
            raws.iter()
                .enumerate()
                .map(|(i, raw)| {
                    let original = normalize(raw);
                    let cleaned = clean_substance_name(&original);
                    let status_flag = status_flag_for(&cleaned, MappingKind::Substance);
                    Identifier {
                        original,
                        cleaned,
                        status_flag,
                        index: i,
                    }
                })
                .collect(),
        ))
    }

    #[tokio::test]
    async fn worker_count_does_not_change_the_result() {
        let left = substance_collection(&[
            "AMIODARONE HYDROCHLORIDE",
            "PRAZEPAM",
            "USP",
            "NAPROXEN NA",
        ]);
        let right = substance_collection(&[
            "AMIODARONE HCL USP",
            "LORAZEPAM",
            "NAPROXEN SODIUM",
            "LIDOCAINE",
        ]);
        let config = Arc::new(get_mapping_config("substance_orange_book_to_usdmf").unwrap().clone());

        let serial = run_matching(left.clone(), right.clone(), config.clone(), 1, false)
            .await
            .unwrap();
        let parallel = run_matching(left, right, config, 4, false)
            .await
            .unwrap();

        assert_eq!(serial.candidates, parallel.candidates);
        assert_eq!(serial.stats.candidates_emitted, parallel.stats.candidates_emitted);
    }

    #[tokio::test]
    async fn candidates_are_sorted_and_echo_original_strings() {
        let left = substance_collection(&["NAPROXEN NA", "AMIODARONE HYDROCHLORIDE"]);
        let right = substance_collection(&["AMIODARONE HCL USP", "NAPROXEN SODIUM"]);
        let config = Arc::new(get_mapping_config("substance_orange_book_to_usdmf").unwrap().clone());

        let output = run_matching(left, right, config, 2, false).await.unwrap();
        let keys: Vec<(usize, usize)> = output
            .candidates
            .iter()
            .map(|c| (c.item_1_orig_index, c.item_2_orig_index))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        for pair in &output.candidates {
            assert!(!pair.item_1.is_empty());
            assert!(!pair.item_2.is_empty());
        }
    }

    #[tokio::test]
    async fn empty_left_side_completes_with_zero_candidates() {
        let left = substance_collection(&[]);
        let right = substance_collection(&["ASPIRIN"]);
        let config = Arc::new(get_mapping_config("substance_orange_book_to_usdmf").unwrap().clone());

        let output = run_matching(left, right, config, 2, true).await.unwrap();
        assert!(output.candidates.is_empty());
        assert!(output.discrepancies.is_empty());
        assert_eq!(output.stats.items_processed, 0);
    }

    #[tokio::test]
    async fn stats_account_for_every_left_item() {
        // "USP" cleans to the empty string and counts as skipped-empty.
        let left = substance_collection(&["AMIODARONE HYDROCHLORIDE", "USP", "PRAZEPAM"]);
        let right = substance_collection(&["AMIODARONE HCL USP", "LORAZEPAM"]);
        let config = Arc::new(get_mapping_config("substance_orange_book_to_usdmf").unwrap().clone());

        let output = run_matching(left, right, config, 2, false).await.unwrap();
        assert_eq!(output.stats.items_processed, 3);
        assert_eq!(output.stats.items_skipped_empty, 1);
        assert_eq!(output.stats.items_failed, 0);
    }

    #[tokio::test]
    async fn panicked_task_degrades_to_zero_candidates_for_its_item() {
        let left = substance_collection(&["ASPIRIN", "IBUPROFEN"]);

        let mut first = MatchOutcome::default();
        first.candidates.insert(0);
        let mut tasks: Vec<JoinHandle<Result<(usize, MatchOutcome)>>> = Vec::new();
        tasks.push(tokio::spawn(async move { Ok((0, first)) }));
        tasks.push(tokio::spawn(async { panic!("scorer overflow") }));

        let (outcomes, stats) = collect_outcomes(tasks, &left).await;
        assert_eq!(stats.items_failed, 1);
        assert_eq!(stats.items_processed, 1);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, 0);
        assert!(outcomes[0].1.candidates.contains(&0));
    }
}
