// src/arbiter.rs - File-side protocol for the external semantic arbiter
//
// Candidates are packaged into chat-completion request batches (JSONL files
// plus a recap manifest); verdicts come back as JSONL response files dropped
// into the newest batch folder's outputs/ directory. Submission and
// retrieval of the files themselves happen outside this tool.
use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::{MappingConfig, MappingKind};
use crate::models::CandidatePair;

const ARBITER_MODEL: &str = "gpt-4o";
// A supplier verdict is accepted when either confidence clears this bar.
const CONFIDENCE_ACCEPT: f64 = 0.7;

pub const SUBSTANCE_PROMPT: &str = r#"
You are an expert in the pharmaceutical industry and are reviewing the properties of two active substances:
For each of the provided mappings, determine if active_substance_1 and active_substance_2 :
- Have the same base molecule.
- Have the same complete form.
- Is one of the substances is a diluted form of the other.
Example:
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Naproxen Na" -> same_base: true, same_form: true, is_diluted: false
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Naproxeno sodico" -> same_base: true (assuming it's just Spanish name), same_form: true, is_diluted: false
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Naproxeno HYDROCHLORIDE" -> same_base: true, same_form: false, is_diluted: false
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Naproxen base" -> same_base: false, same_form: false, is_diluted: false
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Ibuprofen" -> same_base: false, same_form: false, is_diluted: false
- active_substance_1: "NAPROXEN SODIUM", active_substance_2: "Naproxen Sodium Monohydrate" -> same_base: true, same_form: false, is_diluted: false (it's a different form of the same base)
- active_substance_1: "Docetaxel", active_substance_2: "Anhydrous Docetaxel" -> same_base: true, same_form: false, is_diluted: false
- active_substance_1: "Pemetrexed", active_substance_2: "Pemetrexed disodium 2.5-hydrate" -> same_base: true, same_form: false, is_diluted: false
- active_substance_1: "Zoledronic Acid Monohydrate", active_substance_2: "Zoledronic acid monohydrate" -> same_base: true, same_form: true, is_diluted: false
- active_substance_1: "Urea (13C)", active_substance_2: "13c-Urea" -> same_base: true, same_form: true, is_diluted: false
- active_substance_1: "Acidum Picrinicum D4", active_substance_2: "Acidum picrinicum for homoeopathic preparations" -> same_base: true, same_form: false, is_diluted: true
- active_substance_1: "Docetaxel", active_substance_2: "Docetaxel USP" -> same_base: true, same_form: true, is_diluted: false (assuming USP, United States Pharmacopeia, is just a standard)
"#;

pub const SUPPLIER_PROMPT: &str = r#"
You are a pharmaceutical industry analysis AI. Your task is to process provided mappings, each containing `item_1` and `item_2`. For each mapping, determine the required output values.

* **Supplier Site:** A specific manufacturing plant/facility/named location (e.g., "Pfizer Ringaskiddy," "Site B", "Plant Y").
* **Supplier Company:** The overall corporate/legal entity or potentially a distinct regional branch/subsidiary (e.g., "Pfizer Inc.," "Bayer AG", "Agno China").
* **Ambiguity Rule:** If a name *clearly* indicates a specific physical plant or facility using terms like 'Plant', 'Site', 'Facility', or a specific known plant name, classify it as **Supplier Site**. If a name includes a geographic term but lacks specific site language (e.g., 'Agno China'), lean towards classifying it as **Supplier Company** representing regional operations.

For each mapping:
1. Classify `item_1`: determine `is_item_1_supplier_site` (boolean).
2. Classify `item_2`: determine `is_item_2_supplier_site` (boolean).
3. Assess the likelihood that both names represent the exact same physical site: `confidence_score_match_site_level` (float, 0.0 to 1.0). A high score (> 0.9) requires both classifications to be site-level and evidence of the same location.
4. Assess the likelihood that both names belong to the same company group, comparing core company names after stripping legal suffixes, site designators and geographic prefixes: `confidence_score_are_part_of_same_company` (float, 0.0 to 1.0). Assign > 0.9 only when the core names are virtually identical or shared ultimate ownership is confirmed; assign 0.7 when core names match well but secondary descriptors differ; assign < 0.3 when core identities clearly differ or the similarity rests solely on shared geographic or generic industry terms.

Output the original `item_1` and `item_2` alongside the four determined values for every mapping.
"#;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubstanceVerdict {
    pub active_substance_1: String,
    pub active_substance_2: String,
    pub have_same_base: bool,
    pub have_same_form: bool,
    pub is_diluted: bool,
}

impl SubstanceVerdict {
    pub fn is_accepted(&self) -> bool {
        self.have_same_base || self.have_same_form || self.is_diluted
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SupplierVerdict {
    pub item_1: String,
    pub is_item_1_supplier_site: bool,
    pub item_2: String,
    pub is_item_2_supplier_site: bool,
    pub confidence_score_match_site_level: f64,
    pub confidence_score_are_part_of_same_company: f64,
}

impl SupplierVerdict {
    pub fn is_accepted(&self) -> bool {
        self.confidence_score_match_site_level >= CONFIDENCE_ACCEPT
            || self.confidence_score_are_part_of_same_company >= CONFIDENCE_ACCEPT
    }
}

/// Every verdict retrieved for one mapping, already typed by mapping kind.
#[derive(Debug)]
pub enum VerdictSet {
    Substance(Vec<SubstanceVerdict>),
    Supplier(Vec<SupplierVerdict>),
}

#[derive(Debug, Deserialize)]
struct SubstanceVerdictEnvelope {
    mappings: Vec<SubstanceVerdict>,
}

#[derive(Debug, Deserialize)]
struct SupplierVerdictEnvelope {
    mappings: Vec<SupplierVerdict>,
}

/// Accumulates request lines into size-bounded JSONL files under one batch
/// inputs/ folder, recording every file for the recap manifest.
struct BatchWriter {
    inputs_dir: PathBuf,
    batch_size: usize,
    dry_run: bool,
    current_path: PathBuf,
    current_count: usize,
    files: Vec<PathBuf>,
}

impl BatchWriter {
    fn new(inputs_dir: PathBuf, batch_size: usize, dry_run: bool) -> Result<Self> {
        if !dry_run {
            fs::create_dir_all(&inputs_dir)
                .with_context(|| format!("Failed to create {}", inputs_dir.display()))?;
        }
        let current_path = inputs_dir.join(format!("{}.jsonl", Uuid::new_v4()));
        Ok(Self {
            inputs_dir,
            batch_size,
            dry_run,
            current_path,
            current_count: 0,
            files: Vec::new(),
        })
    }

    fn add(&mut self, line: &str, increment: usize) -> Result<()> {
        if self.current_count >= self.batch_size {
            self.roll_file();
        }
        if !self.dry_run {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.current_path)
                .with_context(|| format!("Failed to open {}", self.current_path.display()))?;
            writeln!(file, "{}", line)
                .with_context(|| format!("Failed to write {}", self.current_path.display()))?;
        }
        self.current_count += increment;
        Ok(())
    }

    fn roll_file(&mut self) {
        if self.current_count > 0 {
            self.files.push(self.current_path.clone());
        }
        self.current_path = self.inputs_dir.join(format!("{}.jsonl", Uuid::new_v4()));
        self.current_count = 0;
    }

    fn conclude(mut self) -> Vec<PathBuf> {
        if self.current_count > 0 {
            self.files.push(self.current_path.clone());
        }
        self.files
    }
}

fn prompt_for(kind: MappingKind) -> Result<&'static str> {
    match kind {
        MappingKind::Substance => Ok(SUBSTANCE_PROMPT),
        MappingKind::Supplier => Ok(SUPPLIER_PROMPT),
        MappingKind::Merge => bail!("Merge mappings do not go through the arbiter"),
    }
}

/// Package candidates into arbiter request files under a fresh timestamped
/// batch folder. Returns the folder path. A dry run logs the shape of the
/// work without touching the filesystem.
pub fn generate_requests(
    candidates: &[CandidatePair],
    config: &MappingConfig,
    dry_run: bool,
) -> Result<PathBuf> {
    let prompt = prompt_for(config.kind)?;
    let timestamp = Local::now().format("%Y_%m_%d_%H_%M_%S");
    let batch_folder = Path::new(&config.batches_dir()).join(timestamp.to_string());
    let inputs_dir = batch_folder.join("inputs");

    let chunk_count = candidates.len().div_ceil(config.request_item_size.max(1));
    info!(
        "📦 Packaging {} candidates into {} arbiter requests under {}{}",
        candidates.len(),
        chunk_count,
        batch_folder.display(),
        if dry_run { " (dry run)" } else { "" }
    );

    let mut writer = BatchWriter::new(inputs_dir.clone(), config.batch_size, dry_run)?;
    for chunk in candidates.chunks(config.request_item_size.max(1)) {
        let payload: Vec<serde_json::Value> = chunk
            .iter()
            .map(|pair| json!({ "item_1": pair.item_1, "item_2": pair.item_2 }))
            .collect();
        let system_content = format!(
            "{}\nHere are the mappings (in JSON format):\n{}",
            prompt,
            serde_json::to_string(&payload)?
        );
        let request = json!({
            "custom_id": format!("mappings-{}", Uuid::new_v4()),
            "method": "POST",
            "url": "/v1/chat/completions",
            "body": {
                "model": ARBITER_MODEL,
                "temperature": 0,
                "messages": [{ "role": "system", "content": system_content }],
            }
        });
        writer.add(&serde_json::to_string(&request)?, chunk.len())?;
    }

    let files = writer.conclude();
    let recap = json!({
        "batches": files
            .iter()
            .map(|path| json!({ "batch_input_file_path": path }))
            .collect::<Vec<_>>()
    });
    if !dry_run {
        let recap_path = inputs_dir.join("batch_recap.json");
        fs::write(&recap_path, serde_json::to_string_pretty(&recap)?)
            .with_context(|| format!("Failed to write {}", recap_path.display()))?;
        info!(
            "✅ Wrote {} request file(s) and batch_recap.json",
            files.len()
        );
    }
    Ok(batch_folder)
}

/// Load verdicts from the newest batch folder's outputs/ directory. Folder
/// names are timestamps, so a reverse lexicographic sort finds the latest.
pub fn load_latest_verdicts(config: &MappingConfig) -> Result<VerdictSet> {
    let batches_dir = PathBuf::from(config.batches_dir());
    let mut folders: Vec<PathBuf> = fs::read_dir(&batches_dir)
        .with_context(|| format!("No batches found under {}", batches_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    folders.sort();
    let latest = folders
        .pop()
        .with_context(|| format!("No batch folders under {}", batches_dir.display()))?;
    let outputs_dir = latest.join("outputs");
    info!("📬 Reading arbiter verdicts from {}", outputs_dir.display());

    let mut contents = Vec::new();
    for entry in fs::read_dir(&outputs_dir)
        .with_context(|| format!("No outputs directory at {}", outputs_dir.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let file = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for line in file.lines().filter(|l| !l.trim().is_empty()) {
            let record: serde_json::Value = serde_json::from_str(line)
                .with_context(|| format!("Malformed response line in {}", path.display()))?;
            let Some(choices) = record
                .pointer("/response/body/choices")
                .and_then(|c| c.as_array())
            else {
                continue;
            };
            for choice in choices {
                if let Some(content) = choice.pointer("/message/content").and_then(|c| c.as_str())
                {
                    contents.push(content.to_string());
                }
            }
        }
    }

    let mut recovered = 0usize;
    match config.kind {
        MappingKind::Substance => {
            let mut verdicts = Vec::new();
            for content in &contents {
                match parse_content::<SubstanceVerdictEnvelope>(content, &mut recovered) {
                    Some(envelope) => verdicts.extend(envelope.mappings),
                    None => warn!("Unparseable arbiter content dropped"),
                }
            }
            report_recovery(recovered, contents.len());
            Ok(VerdictSet::Substance(verdicts))
        }
        MappingKind::Supplier => {
            let mut verdicts = Vec::new();
            for content in &contents {
                match parse_content::<SupplierVerdictEnvelope>(content, &mut recovered) {
                    Some(envelope) => verdicts.extend(envelope.mappings),
                    None => warn!("Unparseable arbiter content dropped"),
                }
            }
            report_recovery(recovered, contents.len());
            Ok(VerdictSet::Supplier(verdicts))
        }
        MappingKind::Merge => bail!("Merge mappings do not go through the arbiter"),
    }
}

/// Parse a verdict payload. Responses occasionally truncate mid-array; in
/// that case the last partial object is dropped and the array closed, which
/// salvages every complete verdict before the cut.
fn parse_content<T: for<'de> Deserialize<'de>>(content: &str, recovered: &mut usize) -> Option<T> {
    if let Ok(parsed) = serde_json::from_str::<T>(content) {
        return Some(parsed);
    }
    let cut = content.rfind(",{")?;
    let repaired = format!("{}]}}", &content[..cut]);
    match serde_json::from_str::<T>(&repaired) {
        Ok(parsed) => {
            *recovered += 1;
            Some(parsed)
        }
        Err(_) => None,
    }
}

fn report_recovery(recovered: usize, total: usize) {
    if recovered > 0 {
        warn!(
            "Recovered {} truncated arbiter response(s) out of {}",
            recovered, total
        );
    }
}
