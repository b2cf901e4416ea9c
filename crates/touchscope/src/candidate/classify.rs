//! Split a flat list of cleaned MEV transactions into candidate groups.
//!
//! Arbitrage and liquidation candidates are one record per transaction.
//! Sandwiches are assembled from consecutive entries:
//! `frontrun`, zero or more `sandwich` victims, then `backrun`.

use super::schema::{CleanMevTx, SandwichRecord, SingleTxRecord};
use crate::utils::error::CandidateError;
use log::{debug, info};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const ARB: &str = "arb";
const LIQUID: &str = "liquid";
const FRONTRUN: &str = "frontrun";
const VICTIM: &str = "sandwich";
const BACKRUN: &str = "backrun";

/// Candidates split by MEV pattern
#[derive(Debug, Clone, Default)]
pub struct ClassifiedCandidates {
    pub arbitrages: Vec<SingleTxRecord>,
    pub liquidations: Vec<SingleTxRecord>,
    pub sandwiches: Vec<SandwichRecord>,
    /// Sandwiches abandoned because of a second front-run or a stray back-run
    pub malformed_sandwiches: usize,
}

/// Read a cleaned MEV transaction list
pub fn read_clean_transactions(path: impl AsRef<Path>) -> Result<Vec<CleanMevTx>, CandidateError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CandidateError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| CandidateError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Classify cleaned transactions into candidate records
///
/// **Public** - main entry point for the classify command
pub fn classify(transactions: &[CleanMevTx]) -> ClassifiedCandidates {
    let mut classified = ClassifiedCandidates::default();

    for tx in transactions {
        if tx.mev_type == ARB {
            classified.arbitrages.push(SingleTxRecord { tx: tx.clone() });
        } else if tx.mev_type == LIQUID {
            classified.liquidations.push(SingleTxRecord { tx: tx.clone() });
        }
    }

    assemble_sandwiches(transactions, &mut classified);

    info!(
        "Classified {} arbitrages, {} liquidations, {} sandwiches ({} malformed)",
        classified.arbitrages.len(),
        classified.liquidations.len(),
        classified.sandwiches.len(),
        classified.malformed_sandwiches
    );

    classified
}

/// Only classic front-run / victims / back-run sandwiches are kept.
fn assemble_sandwiches(transactions: &[CleanMevTx], classified: &mut ClassifiedCandidates) {
    let mut open: Option<(CleanMevTx, Vec<CleanMevTx>)> = None;

    for tx in transactions {
        match tx.mev_type.as_str() {
            FRONTRUN => {
                if let Some((front_run, _)) = open.take() {
                    debug!(
                        "Found multi-frontrun at block {} (dropping bundle opened by {})",
                        tx.block_num, front_run.hash
                    );
                    classified.malformed_sandwiches += 1;
                }
                open = Some((tx.clone(), Vec::new()));
            }
            VICTIM => {
                if let Some((_, victims)) = open.as_mut() {
                    victims.push(tx.clone());
                }
            }
            BACKRUN => match open.take() {
                Some((front_run, victims)) => classified.sandwiches.push(SandwichRecord {
                    front_run,
                    victims,
                    back_run: tx.clone(),
                }),
                None => {
                    debug!("Found multi-backrun at block {}", tx.block_num);
                    classified.malformed_sandwiches += 1;
                }
            },
            _ => {}
        }
    }

    if let Some((front_run, _)) = open {
        debug!("Dropping unterminated sandwich opened by {}", front_run.hash);
        classified.malformed_sandwiches += 1;
    }
}
