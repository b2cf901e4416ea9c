//! Candidate groups: schema, loading, and classification.
//!
//! This module handles:
//! - Parsing candidate files (arbitrage, liquidation, sandwich records)
//! - Registering groups into the set of blocks and transactions to replay
//! - Splitting cleaned MEV transaction lists into candidate files

pub mod classify;
pub mod loader;
pub mod schema;

// Re-export main types
pub use classify::{classify, read_clean_transactions, ClassifiedCandidates};
pub use loader::{load_candidates, read_candidate_file, register_candidates, LoadedCandidates, RegisteredSet};
pub use schema::{
    CandidateRecord, CleanMevTx, Group, GroupId, GroupKind, GroupStatus, SandwichRecord,
    SingleTxRecord,
};
