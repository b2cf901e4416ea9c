//! Per-group touch aggregation.
//!
//! The store owns every group in a fixed arena indexed by [`GroupId`]. Touch
//! counts only ever grow, and a group stops accepting touches once its owning
//! block has finished replaying.

use crate::candidate::{Group, GroupId, GroupStatus};
use alloy_primitives::{Address, B256};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Address → touch statistics for one group
pub type TouchAddressMap = BTreeMap<Address, TouchAddress>;

/// Touch statistics of one address within one group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchAddress {
    /// Number of touch events recorded for the address
    pub invoke_count: u64,

    /// Number of touch events per storage key
    pub key_histogram: BTreeMap<B256, u64>,
}

impl TouchAddress {
    fn record(&mut self, key: B256) {
        self.invoke_count += 1;
        *self.key_histogram.entry(key).or_insert(0) += 1;
    }
}

/// Why a touch could not be recorded
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectedTouch {
    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),

    #[error("group {0} is frozen")]
    Frozen(GroupId),
}

/// How the replay of a block ended, from the store's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFinish {
    /// Engine returned successfully
    Completed,
    /// Engine or state resolution failed; touches recorded so far are kept
    Failed,
    /// Consumer gave up (timeout or cancellation)
    Abandoned,
}

/// Arena of groups and their touch aggregation
///
/// Single writer: only the replay consumer mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStore {
    groups: Vec<Group>,
}

impl AggregationStore {
    /// Wrap a group collection produced by the candidate loader
    ///
    /// Group ids are reassigned to their arena position so that lookups by id
    /// always land on the right slot.
    pub fn new(mut groups: Vec<Group>) -> Self {
        for (index, group) in groups.iter_mut().enumerate() {
            group.id = GroupId(index);
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn touch_map(&self, id: GroupId) -> Option<&TouchAddressMap> {
        self.group(id).map(|group| &group.touch_address_map)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Record one touch of `address` / `key` for group `id`
    ///
    /// **Public** - called by the attribution resolver for every attributed event
    pub fn record(&mut self, id: GroupId, address: Address, key: B256) -> Result<(), RejectedTouch> {
        let group = self
            .groups
            .get_mut(id.0)
            .ok_or(RejectedTouch::UnknownGroup(id))?;

        if group.status.is_frozen() {
            return Err(RejectedTouch::Frozen(id));
        }

        group
            .touch_address_map
            .entry(address)
            .or_default()
            .record(key);

        Ok(())
    }

    /// Freeze the groups of a finished block
    ///
    /// Only groups that received at least one touch become visited, whether
    /// the block completed or failed part way.
    pub fn finish_block(&mut self, ids: &[GroupId], finish: BlockFinish) {
        for id in ids {
            let Some(group) = self.groups.get_mut(id.0) else {
                continue;
            };
            if group.status.is_frozen() {
                continue;
            }

            group.status = match finish {
                BlockFinish::Abandoned => GroupStatus::Abandoned,
                _ if !group.touch_address_map.is_empty() => GroupStatus::Visited,
                BlockFinish::Completed => GroupStatus::Untouched,
                BlockFinish::Failed => GroupStatus::Failed,
            };

            debug!(
                "Group {} ({}) in block {} is now {:?} with {} touched addresses",
                group.id,
                group.description.name(),
                group.block_number,
                group.status,
                group.touch_address_map.len()
            );
        }
    }

    /// Groups eligible for output
    pub fn visited_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups
            .iter()
            .filter(|group| group.status == GroupStatus::Visited)
    }

    pub fn visited_count(&self) -> usize {
        self.visited_groups().count()
    }

    /// Consume the store, keeping only visited groups
    pub fn into_visited(self) -> Vec<Group> {
        self.groups
            .into_iter()
            .filter(|group| group.status == GroupStatus::Visited)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{CleanMevTx, GroupKind};
    use pretty_assertions::assert_eq;

    fn group(block: u64, seed: u8) -> Group {
        Group::new(
            GroupId(usize::MAX),
            GroupKind::Arbitrage {
                tx: CleanMevTx {
                    block_num: block,
                    hash: B256::repeat_byte(seed),
                    mev_type: "arb".to_string(),
                    protocol: String::new(),
                    user_swap_cnt: 0,
                    extractor_swap_cnt: 0,
                    from: Address::ZERO,
                    to: None,
                },
            },
        )
    }

    #[test]
    fn test_new_reassigns_dense_ids() {
        let store = AggregationStore::new(vec![group(1, 1), group(2, 2)]);
        assert_eq!(store.group(GroupId(1)).unwrap().block_number, 2);
        assert_eq!(store.group(GroupId(1)).unwrap().id, GroupId(1));
    }

    #[test]
    fn test_record_counts_invocations_and_keys() {
        let mut store = AggregationStore::new(vec![group(1, 1)]);
        let address = Address::repeat_byte(0x0a);
        let k1 = B256::repeat_byte(0x01);
        let k2 = B256::repeat_byte(0x02);

        for key in [k1, k1, k2] {
            store.record(GroupId(0), address, key).unwrap();
        }

        let touched = &store.touch_map(GroupId(0)).unwrap()[&address];
        assert_eq!(touched.invoke_count, 3);
        assert_eq!(touched.key_histogram, BTreeMap::from([(k1, 2), (k2, 1)]));
    }

    #[test]
    fn test_record_rejected_after_freeze() {
        let mut store = AggregationStore::new(vec![group(1, 1)]);
        store.finish_block(&[GroupId(0)], BlockFinish::Completed);

        let result = store.record(GroupId(0), Address::ZERO, B256::ZERO);
        assert_eq!(result, Err(RejectedTouch::Frozen(GroupId(0))));
        assert!(store.touch_map(GroupId(0)).unwrap().is_empty());
    }

    #[test]
    fn test_record_unknown_group() {
        let mut store = AggregationStore::new(vec![]);
        let result = store.record(GroupId(4), Address::ZERO, B256::ZERO);
        assert_eq!(result, Err(RejectedTouch::UnknownGroup(GroupId(4))));
    }

    #[test]
    fn test_failed_block_keeps_touched_groups_visited() {
        let mut store = AggregationStore::new(vec![group(5, 1), group(5, 2)]);
        store.record(GroupId(0), Address::ZERO, B256::ZERO).unwrap();

        store.finish_block(&[GroupId(0), GroupId(1)], BlockFinish::Failed);

        assert_eq!(store.group(GroupId(0)).unwrap().status, GroupStatus::Visited);
        assert_eq!(store.group(GroupId(1)).unwrap().status, GroupStatus::Failed);
        assert_eq!(store.visited_count(), 1);
    }

    #[test]
    fn test_abandoned_block_is_not_visited() {
        let mut store = AggregationStore::new(vec![group(5, 1)]);
        store.record(GroupId(0), Address::ZERO, B256::ZERO).unwrap();
        store.finish_block(&[GroupId(0)], BlockFinish::Abandoned);

        assert_eq!(store.group(GroupId(0)).unwrap().status, GroupStatus::Abandoned);
        assert!(store.into_visited().is_empty());
    }

    #[test]
    fn test_completed_block_without_touches_is_not_visited() {
        let mut store = AggregationStore::new(vec![group(5, 1), group(5, 2)]);
        store.record(GroupId(0), Address::ZERO, B256::ZERO).unwrap();

        store.finish_block(&[GroupId(0), GroupId(1)], BlockFinish::Completed);

        assert_eq!(store.group(GroupId(0)).unwrap().status, GroupStatus::Visited);
        assert_eq!(store.group(GroupId(1)).unwrap().status, GroupStatus::Untouched);
        assert_eq!(store.visited_count(), 1);
    }

    #[test]
    fn test_finish_block_does_not_refreeze() {
        let mut store = AggregationStore::new(vec![group(5, 1)]);
        store.finish_block(&[GroupId(0)], BlockFinish::Completed);
        store.finish_block(&[GroupId(0)], BlockFinish::Abandoned);
        assert_eq!(store.group(GroupId(0)).unwrap().status, GroupStatus::Untouched);
    }
}
