//! Classify command implementation.
//!
//! Splits a cleaned MEV transaction list into the three candidate files the
//! replay command consumes.

use super::models::ClassifyArgs;
use crate::candidate::{classify, read_clean_transactions, ClassifiedCandidates};
use crate::output::write_json;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// Paths of the files written by the classify command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFiles {
    pub arbitrage: PathBuf,
    pub liquidation: PathBuf,
    pub sandwich: PathBuf,
}

impl CandidateFiles {
    /// `<dir>/<stem>_arb.json`, `<dir>/<stem>_liquid.json`, `<dir>/<stem>_sandwich.json`
    pub fn for_input(input: &Path, output_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "candidates".to_string());
        let dir = output_dir
            .map(Path::to_path_buf)
            .or_else(|| input.parent().map(Path::to_path_buf))
            .unwrap_or_default();

        Self {
            arbitrage: dir.join(format!("{}_arb.json", stem)),
            liquidation: dir.join(format!("{}_liquid.json", stem)),
            sandwich: dir.join(format!("{}_sandwich.json", stem)),
        }
    }
}

/// Execute the classify command
///
/// **Public** - main entry point called from main.rs
pub fn execute_classify(args: ClassifyArgs) -> Result<(ClassifiedCandidates, CandidateFiles)> {
    info!("Classifying: {}", args.input.display());

    let transactions = read_clean_transactions(&args.input).context("Failed to read cleaned transactions")?;
    let classified = classify(&transactions);

    let files = CandidateFiles::for_input(&args.input, args.output_dir.as_deref());
    write_json(&classified.arbitrages, &files.arbitrage).context("Failed to write arbitrage candidates")?;
    write_json(&classified.liquidations, &files.liquidation)
        .context("Failed to write liquidation candidates")?;
    write_json(&classified.sandwiches, &files.sandwich).context("Failed to write sandwich candidates")?;

    println!("✓ {} arbitrage  -> {}", classified.arbitrages.len(), files.arbitrage.display());
    println!("✓ {} liquidation -> {}", classified.liquidations.len(), files.liquidation.display());
    println!("✓ {} sandwich   -> {}", classified.sandwiches.len(), files.sandwich.display());
    if classified.malformed_sandwiches > 0 {
        println!("  {} malformed sandwich sequences skipped", classified.malformed_sandwiches);
    }

    Ok((classified, files))
}
