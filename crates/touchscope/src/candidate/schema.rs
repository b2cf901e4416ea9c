//! Candidate and group schema definitions.
//!
//! Input records mirror the cleaned MEV transaction files produced upstream
//! (PascalCase field names). [`Group`] is the in-memory and output form of a
//! registered candidate together with its touch aggregation.

use crate::aggregator::TouchAddressMap;
use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cleaned MEV transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanMevTx {
    #[serde(rename = "BlockNum")]
    pub block_num: u64,

    #[serde(rename = "Hash")]
    pub hash: TxHash,

    /// MEV classification: `arb`, `liquid`, `frontrun`, `sandwich` or `backrun`
    #[serde(rename = "MEVType")]
    pub mev_type: String,

    #[serde(rename = "Protocol", default)]
    pub protocol: String,

    #[serde(rename = "UserSwapCnt", default)]
    pub user_swap_cnt: i64,

    #[serde(rename = "ExtractorSwapCnt", default)]
    pub extractor_swap_cnt: i64,

    #[serde(rename = "From")]
    pub from: Address,

    /// `None` for contract-creation transactions
    #[serde(rename = "To", default)]
    pub to: Option<Address>,
}

/// Single-transaction candidate (arbitrage or liquidation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleTxRecord {
    #[serde(rename = "Tx")]
    pub tx: CleanMevTx,
}

/// Three-part sandwich candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandwichRecord {
    #[serde(rename = "FrontRun")]
    pub front_run: CleanMevTx,

    #[serde(rename = "VictimTx", default)]
    pub victims: Vec<CleanMevTx>,

    #[serde(rename = "BackRun")]
    pub back_run: CleanMevTx,
}

/// Any record found in a candidate file
///
/// Sandwiches are tried first: a sandwich record never carries a `Tx` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateRecord {
    Sandwich(SandwichRecord),
    Single(SingleTxRecord),
}

/// Dense index of a group inside the aggregation arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of the MEV pattern a group represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKind {
    Arbitrage {
        tx: CleanMevTx,
    },
    Liquidation {
        tx: CleanMevTx,
    },
    Sandwich {
        front_run: CleanMevTx,
        victims: Vec<CleanMevTx>,
        back_run: CleanMevTx,
    },
}

impl GroupKind {
    /// Block that must be replayed to populate this group
    pub fn block_number(&self) -> u64 {
        match self {
            Self::Arbitrage { tx } | Self::Liquidation { tx } => tx.block_num,
            Self::Sandwich { front_run, .. } => front_run.block_num,
        }
    }

    /// Every transaction id belonging to the group, in execution role order
    pub fn transaction_ids(&self) -> Vec<TxHash> {
        match self {
            Self::Arbitrage { tx } | Self::Liquidation { tx } => vec![tx.hash],
            Self::Sandwich {
                front_run,
                victims,
                back_run,
            } => std::iter::once(front_run.hash)
                .chain(victims.iter().map(|v| v.hash))
                .chain(std::iter::once(back_run.hash))
                .collect(),
        }
    }

    /// Short name used in logs and summaries
    pub fn name(&self) -> &'static str {
        match self {
            Self::Arbitrage { .. } => "arbitrage",
            Self::Liquidation { .. } => "liquidation",
            Self::Sandwich { .. } => "sandwich",
        }
    }
}

impl From<SingleTxRecord> for GroupKind {
    fn from(record: SingleTxRecord) -> Self {
        if record.tx.mev_type.eq_ignore_ascii_case("liquid") {
            Self::Liquidation { tx: record.tx }
        } else {
            Self::Arbitrage { tx: record.tx }
        }
    }
}

impl From<SandwichRecord> for GroupKind {
    fn from(record: SandwichRecord) -> Self {
        Self::Sandwich {
            front_run: record.front_run,
            victims: record.victims,
            back_run: record.back_run,
        }
    }
}

/// Lifecycle of a group's aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Owning block not replayed yet; the only mutable state
    #[default]
    Pending,
    /// Owning block replayed and at least one event reached the group; eligible for output
    Visited,
    /// Owning block completed without any event reaching the group
    Untouched,
    /// Owning block failed before any event reached this group
    Failed,
    /// Owning block timed out or was cancelled
    Abandoned,
}

impl GroupStatus {
    pub fn is_frozen(self) -> bool {
        self != Self::Pending
    }
}

/// A registered MEV group and its touch aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub block_number: u64,
    pub description: GroupKind,
    #[serde(default)]
    pub status: GroupStatus,
    #[serde(default)]
    pub touch_address_map: TouchAddressMap,
}

impl Group {
    /// Create a pending group with an empty touch map
    pub fn new(id: GroupId, description: GroupKind) -> Self {
        Self {
            id,
            block_number: description.block_number(),
            description,
            status: GroupStatus::Pending,
            touch_address_map: TouchAddressMap::new(),
        }
    }
}
