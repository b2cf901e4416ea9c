//! Attribution of touch events to their owning group.
//!
//! The engine reports touches for every transaction in a block. Only events
//! from registered transactions are kept; everything else is noise.

use super::store::{AggregationStore, RejectedTouch};
use crate::candidate::{GroupId, RegisteredSet};
use crate::replay::TouchEvent;
use log::warn;

/// Result of attributing one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribution {
    /// Recorded into the owning group
    Attributed(GroupId),
    /// Transaction is not tracked
    Discarded,
    /// Owning group exists but refused the touch (frozen)
    Refused(GroupId),
}

/// Counters for one block's attribution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributionStats {
    pub attributed: u64,
    pub discarded: u64,
    pub refused: u64,
}

impl AttributionStats {
    pub fn total(&self) -> u64 {
        self.attributed + self.discarded + self.refused
    }
}

/// Routes events into the aggregation store
///
/// Borrowed for the duration of one block's consumption loop, on the
/// consumer task only.
pub struct AttributionResolver<'a> {
    registered: &'a RegisteredSet,
    store: &'a mut AggregationStore,
    stats: AttributionStats,
}

impl<'a> AttributionResolver<'a> {
    pub fn new(registered: &'a RegisteredSet, store: &'a mut AggregationStore) -> Self {
        Self {
            registered,
            store,
            stats: AttributionStats::default(),
        }
    }

    /// Attribute a single touch event
    ///
    /// **Public** - called synchronously for every event the stream delivers
    pub fn attribute(&mut self, event: &TouchEvent) -> Attribution {
        let Some(owner) = self.registered.owner_of(&event.tx_hash) else {
            self.stats.discarded += 1;
            return Attribution::Discarded;
        };

        match self.store.record(owner, event.address, event.storage_key) {
            Ok(()) => {
                self.stats.attributed += 1;
                Attribution::Attributed(owner)
            }
            Err(rejected) => {
                if self.stats.refused == 0 {
                    warn!("Touch from {} refused: {}", event.tx_hash, rejected);
                }
                self.stats.refused += 1;
                match rejected {
                    RejectedTouch::Frozen(id) | RejectedTouch::UnknownGroup(id) => {
                        Attribution::Refused(id)
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> AttributionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::BlockFinish;
    use crate::candidate::{register_candidates, CandidateRecord, CleanMevTx, SingleTxRecord};
    use alloy_primitives::{Address, B256};

    fn registered_single(seed: u8) -> (RegisteredSet, AggregationStore) {
        let loaded = register_candidates(vec![CandidateRecord::Single(SingleTxRecord {
            tx: CleanMevTx {
                block_num: 10,
                hash: B256::repeat_byte(seed),
                mev_type: "arb".to_string(),
                protocol: String::new(),
                user_swap_cnt: 0,
                extractor_swap_cnt: 0,
                from: Address::ZERO,
                to: None,
            },
        })]);
        (loaded.registered, AggregationStore::new(loaded.groups))
    }

    fn event(seed: u8, address: u8) -> TouchEvent {
        TouchEvent {
            tx_hash: B256::repeat_byte(seed),
            address: Address::repeat_byte(address),
            storage_key: B256::ZERO,
        }
    }

    #[test]
    fn test_noise_is_discarded() {
        let (registered, mut store) = registered_single(1);
        let mut resolver = AttributionResolver::new(&registered, &mut store);

        assert_eq!(resolver.attribute(&event(1, 0xaa)), Attribution::Attributed(GroupId(0)));
        assert_eq!(resolver.attribute(&event(2, 0xbb)), Attribution::Discarded);

        let stats = resolver.stats();
        assert_eq!(stats.attributed, 1);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.total(), 2);

        let map = store.touch_map(GroupId(0)).unwrap();
        assert!(map.contains_key(&Address::repeat_byte(0xaa)));
        assert!(!map.contains_key(&Address::repeat_byte(0xbb)));
    }

    #[test]
    fn test_frozen_group_refuses() {
        let (registered, mut store) = registered_single(1);
        store.finish_block(&[GroupId(0)], BlockFinish::Completed);

        let mut resolver = AttributionResolver::new(&registered, &mut store);
        assert_eq!(resolver.attribute(&event(1, 0xaa)), Attribution::Refused(GroupId(0)));
        assert_eq!(resolver.stats().refused, 1);
    }
}
