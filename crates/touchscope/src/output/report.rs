//! Report envelopes written by the CLI.
//!
//! Every envelope carries the schema version and an RFC 3339 generation
//! timestamp.

use crate::analysis::{LabeledGroup, RankedAddress, RankedKey};
use crate::candidate::{Group, GroupStatus};
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Visited groups of a replayed block range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchReport {
    pub version: String,
    pub generated_at: String,
    pub first_block: u64,
    pub last_block: u64,
    pub groups: Vec<Group>,
}

impl TouchReport {
    pub fn new(first_block: u64, last_block: u64, groups: Vec<Group>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            first_block,
            last_block,
            groups,
        }
    }

    /// Check internal consistency of a report read back from disk
    ///
    /// **Public** - used by the validate command
    ///
    /// # Returns
    /// A list of problems; empty when the report is consistent
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.version != SCHEMA_VERSION {
            problems.push(format!(
                "schema version {} (expected {})",
                self.version, SCHEMA_VERSION
            ));
        }
        if self.first_block > self.last_block {
            problems.push(format!(
                "first block {} is after last block {}",
                self.first_block, self.last_block
            ));
        }

        for group in &self.groups {
            if group.status != GroupStatus::Visited {
                problems.push(format!("group {} is {:?}, not visited", group.id, group.status));
            }
            if group.touch_address_map.is_empty() {
                problems.push(format!("group {} has no touched addresses", group.id));
            }
            if group.block_number < self.first_block || group.block_number > self.last_block {
                problems.push(format!(
                    "group {} block {} is outside {}..={}",
                    group.id, group.block_number, self.first_block, self.last_block
                ));
            }
            if group.block_number != group.description.block_number() {
                problems.push(format!("group {} block number disagrees with its description", group.id));
            }
            for (address, touched) in &group.touch_address_map {
                let keyed: u64 = touched.key_histogram.values().sum();
                if keyed != touched.invoke_count {
                    problems.push(format!(
                        "group {} address {}: {} invocations but {} keyed touches",
                        group.id, address, touched.invoke_count, keyed
                    ));
                }
            }
        }

        problems
    }
}

/// Cross-group rankings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub version: String,
    pub generated_at: String,
    pub total_groups: u64,
    pub total_invocations: u64,
    pub commonality: Vec<RankedAddress>,
    pub invocation: Vec<RankedAddress>,
    #[serde(default)]
    pub hot_keys: Vec<RankedKey>,
}

impl RankingReport {
    pub fn new(
        total_groups: u64,
        commonality: Vec<RankedAddress>,
        invocation: Vec<RankedAddress>,
        hot_keys: Vec<RankedKey>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            total_groups,
            total_invocations: invocation.iter().map(|row| row.count).sum(),
            commonality,
            invocation,
            hot_keys,
        }
    }
}

/// Groups with labelled touch maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledGroupReport {
    pub version: String,
    pub generated_at: String,
    pub groups: Vec<LabeledGroup>,
}

impl LabeledGroupReport {
    pub fn new(groups: Vec<LabeledGroup>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            groups,
        }
    }
}
