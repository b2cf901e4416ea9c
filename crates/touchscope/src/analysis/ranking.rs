//! Cross-group address rankings.
//!
//! Both rankings are computed over visited groups only. Ties are ordered by
//! address so repeated runs produce identical reports.

use crate::aggregator::TouchAddressMap;
use crate::candidate::Group;
use crate::labels::{LabelInfo, LabelTable};
use alloy_primitives::{Address, B256};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAddress {
    pub address: Address,
    pub count: u64,
    /// Fraction of the ranking's denominator, in [0, 1]
    pub proportion: f64,
    pub label: LabelInfo,
}

/// One row of the storage slot ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedKey {
    pub address: Address,
    pub key: B256,
    pub count: u64,
    pub proportion: f64,
    pub label: LabelInfo,
}

/// Rank addresses by the number of distinct groups touching them
///
/// **Public** - proportion is relative to the number of groups
pub fn commonality_ranking(groups: &[Group], labels: &LabelTable) -> Vec<RankedAddress> {
    let mut counts: BTreeMap<Address, u64> = BTreeMap::new();
    for group in groups {
        for address in group.touch_address_map.keys() {
            *counts.entry(*address).or_insert(0) += 1;
        }
    }

    debug!("Commonality over {} groups, {} addresses", groups.len(), counts.len());
    rank(counts, groups.len() as u64, labels)
}

/// Rank addresses by their invocation count summed over all groups
///
/// **Public** - proportion is relative to the grand total of invocations
pub fn invocation_ranking(groups: &[Group], labels: &LabelTable) -> Vec<RankedAddress> {
    let mut counts: BTreeMap<Address, u64> = BTreeMap::new();
    for group in groups {
        for (address, touched) in &group.touch_address_map {
            *counts.entry(*address).or_insert(0) += touched.invoke_count;
        }
    }

    let total: u64 = counts.values().sum();
    debug!("Invocation ranking: {} addresses, {} invocations", counts.len(), total);
    rank(counts, total, labels)
}

/// Rank (address, storage key) pairs by touch count summed over all groups
///
/// # Arguments
/// * `top_n` - keep only the first `top_n` rows; proportions still use the full total
pub fn key_ranking(groups: &[Group], labels: &LabelTable, top_n: usize) -> Vec<RankedKey> {
    let mut counts: BTreeMap<(Address, B256), u64> = BTreeMap::new();
    for group in groups {
        for (address, touched) in &group.touch_address_map {
            for (key, count) in &touched.key_histogram {
                *counts.entry((*address, *key)).or_insert(0) += count;
            }
        }
    }

    let total: u64 = counts.values().sum();
    let mut rows: Vec<((Address, B256), u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    rows.into_iter()
        .take(top_n)
        .map(|((address, key), count)| RankedKey {
            address,
            key,
            count,
            proportion: fraction(count, total),
            label: labels.lookup(&address),
        })
        .collect()
}

/// Share of the ranking's total held by its first `n` rows
pub fn top_share(ranking: &[RankedAddress], n: usize) -> f64 {
    ranking.iter().take(n).map(|row| row.proportion).sum()
}

/// Total invocations recorded in one touch map
pub fn total_invocations(map: &TouchAddressMap) -> u64 {
    map.values().map(|touched| touched.invoke_count).sum()
}

fn rank(counts: BTreeMap<Address, u64>, denominator: u64, labels: &LabelTable) -> Vec<RankedAddress> {
    let mut rows: Vec<(Address, u64)> = counts.into_iter().collect();
    // BTreeMap order is by address, and the sort is stable
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    rows.into_iter()
        .map(|(address, count)| RankedAddress {
            address,
            count,
            proportion: fraction(count, denominator),
            label: labels.lookup(&address),
        })
        .collect()
}

fn fraction(count: u64, denominator: u64) -> f64 {
    if denominator > 0 {
        count as f64 / denominator as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TouchAddress;
    use crate::candidate::{CleanMevTx, GroupId, GroupKind};
    use crate::labels::LabelKind;

    fn group(touches: &[(u8, u64)]) -> Group {
        let mut group = Group::new(
            GroupId(0),
            GroupKind::Arbitrage {
                tx: CleanMevTx {
                    block_num: 1,
                    hash: B256::ZERO,
                    mev_type: "arb".to_string(),
                    protocol: String::new(),
                    user_swap_cnt: 0,
                    extractor_swap_cnt: 0,
                    from: Address::ZERO,
                    to: None,
                },
            },
        );
        for (byte, count) in touches {
            group.touch_address_map.insert(
                Address::repeat_byte(*byte),
                TouchAddress {
                    invoke_count: *count,
                    key_histogram: BTreeMap::from([(B256::with_last_byte(*byte), *count)]),
                },
            );
        }
        group
    }

    #[test]
    fn test_invocation_ranking_properties() {
        let groups = vec![group(&[(1, 5), (2, 3)]), group(&[(3, 3), (4, 1)])];
        let ranking = invocation_ranking(&groups, &LabelTable::new());

        assert_eq!(ranking.len(), 4);
        assert!(ranking.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(
            ranking.iter().map(|r| r.count).collect::<Vec<_>>(),
            vec![5, 3, 3, 1]
        );

        let sum: f64 = ranking.iter().map(|r| r.proportion).sum();
        assert!((sum - 1.0).abs() < 1e-9);

        let mut addresses: Vec<Address> = ranking.iter().map(|r| r.address).collect();
        addresses.dedup();
        assert_eq!(addresses.len(), 4);
        assert!(ranking.iter().all(|r| r.label.kind == LabelKind::Unknown));
    }

    #[test]
    fn test_commonality_counts_distinct_groups() {
        let groups = vec![
            group(&[(1, 9), (2, 1)]),
            group(&[(1, 1)]),
            group(&[(1, 1), (3, 1)]),
        ];
        let ranking = commonality_ranking(&groups, &LabelTable::new());

        assert_eq!(ranking[0].address, Address::repeat_byte(1));
        assert_eq!(ranking[0].count, 3);
        assert_eq!(ranking[0].proportion, 1.0);
        // Ties by address
        assert_eq!(ranking[1].address, Address::repeat_byte(2));
        assert_eq!(ranking[2].address, Address::repeat_byte(3));
    }

    #[test]
    fn test_empty_input_has_zero_proportions() {
        assert!(invocation_ranking(&[], &LabelTable::new()).is_empty());
        let ranking = invocation_ranking(&[group(&[(1, 0)])], &LabelTable::new());
        assert_eq!(ranking[0].proportion, 0.0);
    }

    #[test]
    fn test_key_ranking_and_top_share() {
        let groups = vec![group(&[(1, 6), (2, 2)]), group(&[(1, 2)])];
        let keys = key_ranking(&groups, &LabelTable::new(), 1);

        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].count, 8);
        assert_eq!(keys[0].proportion, 0.8);

        let ranking = invocation_ranking(&groups, &LabelTable::new());
        assert_eq!(top_share(&ranking, 1), 0.8);
        assert_eq!(total_invocations(&groups[0].touch_address_map), 8);
    }
}
