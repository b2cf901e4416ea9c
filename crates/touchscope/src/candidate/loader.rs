//! Candidate file loading and registration.
//!
//! Turns candidate records into the registered set (which blocks to replay,
//! which transactions to keep, who owns each transaction) plus the arena of
//! empty groups the aggregation store will fill.

use super::schema::{CandidateRecord, Group, GroupId, GroupKind};
use crate::utils::error::CandidateError;
use alloy_primitives::TxHash;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Blocks and transactions the replay pipeline restricts its attention to
///
/// Built once from the loaded groups and read-only during replay.
#[derive(Debug, Clone, Default)]
pub struct RegisteredSet {
    block_numbers: HashSet<u64>,
    transaction_ids: HashSet<TxHash>,
    owner_of: HashMap<TxHash, GroupId>,
    groups_by_block: BTreeMap<u64, Vec<GroupId>>,
}

impl RegisteredSet {
    pub fn contains_block(&self, block_number: u64) -> bool {
        self.block_numbers.contains(&block_number)
    }

    pub fn contains_transaction(&self, tx_hash: &TxHash) -> bool {
        self.transaction_ids.contains(tx_hash)
    }

    /// Group owning a transaction, if the transaction is tracked
    pub fn owner_of(&self, tx_hash: &TxHash) -> Option<GroupId> {
        self.owner_of.get(tx_hash).copied()
    }

    /// Groups whose transactions live in `block_number`
    pub fn groups_in_block(&self, block_number: u64) -> &[GroupId] {
        self.groups_by_block
            .get(&block_number)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn block_count(&self) -> usize {
        self.block_numbers.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_ids.len()
    }

    fn register(&mut self, id: GroupId, block_number: u64, tx_ids: &[TxHash]) {
        self.block_numbers.insert(block_number);
        self.groups_by_block.entry(block_number).or_default().push(id);
        for tx_hash in tx_ids {
            self.transaction_ids.insert(*tx_hash);
            self.owner_of.insert(*tx_hash, id);
        }
    }
}

/// Output of the candidate loader
#[derive(Debug, Clone, Default)]
pub struct LoadedCandidates {
    pub registered: RegisteredSet,
    pub groups: Vec<Group>,
    /// Records skipped because they violated a structural invariant
    pub rejected: usize,
}

/// Read a single candidate file
///
/// **Public** - used by the replay command and by tests
///
/// # Errors
/// * `CandidateError::Io` - file cannot be opened
/// * `CandidateError::Json` - file is not an array of candidate records
pub fn read_candidate_file(path: impl AsRef<Path>) -> Result<Vec<CandidateRecord>, CandidateError> {
    let path = path.as_ref();
    debug!("Reading candidates from: {}", path.display());

    let file = File::open(path).map_err(|source| CandidateError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let records: Vec<CandidateRecord> =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| CandidateError::Json {
            path: path.display().to_string(),
            source,
        })?;

    info!("Loaded {} candidate records from {}", records.len(), path.display());
    Ok(records)
}

/// Load and register every record from a list of candidate files
///
/// **Public** - main entry point for the replay command
pub fn load_candidates(paths: &[PathBuf]) -> Result<LoadedCandidates, CandidateError> {
    if paths.is_empty() {
        return Err(CandidateError::NoInput);
    }

    let mut records = Vec::new();
    for path in paths {
        records.extend(read_candidate_file(path)?);
    }

    Ok(register_candidates(records))
}

/// Build the registered set and group arena from candidate records
///
/// Records are registered in order, so GroupIds follow input order. A record
/// is rejected as a whole (none of its transactions are registered) when:
/// - it is a sandwich whose front-run and back-run sit in different blocks
/// - one of its transactions is already owned by an earlier group
pub fn register_candidates(records: Vec<CandidateRecord>) -> LoadedCandidates {
    let mut loaded = LoadedCandidates::default();

    for record in records {
        let kind = match record {
            CandidateRecord::Sandwich(sandwich) => {
                if sandwich.front_run.block_num != sandwich.back_run.block_num {
                    warn!(
                        "Skipping sandwich {}: front-run in block {} but back-run in block {}",
                        sandwich.front_run.hash,
                        sandwich.front_run.block_num,
                        sandwich.back_run.block_num
                    );
                    loaded.rejected += 1;
                    continue;
                }
                GroupKind::from(sandwich)
            }
            CandidateRecord::Single(single) => GroupKind::from(single),
        };

        let tx_ids = kind.transaction_ids();
        if let Some(taken) = tx_ids
            .iter()
            .find(|tx_hash| loaded.registered.contains_transaction(tx_hash))
        {
            warn!(
                "Skipping {} group: transaction {} already belongs to group {}",
                kind.name(),
                taken,
                loaded
                    .registered
                    .owner_of(taken)
                    .map(|id| id.to_string())
                    .unwrap_or_default()
            );
            loaded.rejected += 1;
            continue;
        }

        let id = GroupId(loaded.groups.len());
        let group = Group::new(id, kind);
        loaded.registered.register(id, group.block_number, &tx_ids);
        loaded.groups.push(group);
    }

    info!(
        "Registered {} groups ({} rejected): {} blocks, {} transactions",
        loaded.groups.len(),
        loaded.rejected,
        loaded.registered.block_count(),
        loaded.registered.transaction_count()
    );

    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::schema::{CleanMevTx, SandwichRecord, SingleTxRecord};
    use alloy_primitives::{Address, B256};

    fn tx(block: u64, seed: u8, mev_type: &str) -> CleanMevTx {
        CleanMevTx {
            block_num: block,
            hash: B256::repeat_byte(seed),
            mev_type: mev_type.to_string(),
            protocol: String::new(),
            user_swap_cnt: 0,
            extractor_swap_cnt: 0,
            from: Address::repeat_byte(0xaa),
            to: Some(Address::repeat_byte(0xbb)),
        }
    }

    #[test]
    fn test_register_single_and_sandwich() {
        let loaded = register_candidates(vec![
            CandidateRecord::Single(SingleTxRecord { tx: tx(100, 1, "arb") }),
            CandidateRecord::Sandwich(SandwichRecord {
                front_run: tx(200, 2, "frontrun"),
                victims: vec![tx(200, 3, "sandwich"), tx(200, 4, "sandwich")],
                back_run: tx(200, 5, "backrun"),
            }),
        ]);

        assert_eq!(loaded.groups.len(), 2);
        assert_eq!(loaded.rejected, 0);
        assert!(loaded.registered.contains_block(100));
        assert!(loaded.registered.contains_block(200));
        assert!(!loaded.registered.contains_block(150));
        assert_eq!(loaded.registered.transaction_count(), 5);
        assert_eq!(loaded.registered.owner_of(&B256::repeat_byte(4)), Some(GroupId(1)));
        assert_eq!(loaded.registered.groups_in_block(200), &[GroupId(1)]);
    }

    #[test]
    fn test_sandwich_spanning_blocks_rejected_entirely() {
        let loaded = register_candidates(vec![CandidateRecord::Sandwich(SandwichRecord {
            front_run: tx(300, 6, "frontrun"),
            victims: vec![tx(300, 7, "sandwich")],
            back_run: tx(301, 8, "backrun"),
        })]);

        assert!(loaded.groups.is_empty());
        assert_eq!(loaded.rejected, 1);
        assert_eq!(loaded.registered.block_count(), 0);
        for seed in [6u8, 7, 8] {
            assert!(!loaded.registered.contains_transaction(&B256::repeat_byte(seed)));
        }
    }

    #[test]
    fn test_duplicate_transaction_owner_rejected() {
        let loaded = register_candidates(vec![
            CandidateRecord::Single(SingleTxRecord { tx: tx(100, 1, "arb") }),
            CandidateRecord::Single(SingleTxRecord { tx: tx(100, 1, "liquid") }),
        ]);

        assert_eq!(loaded.groups.len(), 1);
        assert_eq!(loaded.rejected, 1);
        assert_eq!(loaded.registered.owner_of(&B256::repeat_byte(1)), Some(GroupId(0)));
    }

    #[test]
    fn test_load_candidates_requires_input() {
        assert!(matches!(load_candidates(&[]), Err(CandidateError::NoInput)));
    }
}
