//! Groups with label information attached to every touched address.

use crate::aggregator::TouchAddress;
use crate::candidate::{Group, GroupId, GroupKind};
use crate::labels::{LabelInfo, LabelTable};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A touched address plus its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledTouch {
    #[serde(flatten)]
    pub touch: TouchAddress,
    pub label: LabelInfo,
}

/// A group whose touch map carries labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledGroup {
    pub id: GroupId,
    pub block_number: u64,
    pub description: GroupKind,
    pub touch_address_map: BTreeMap<Address, LabeledTouch>,
}

/// Attach labels to every address of every group
pub fn label_groups(groups: &[Group], labels: &LabelTable) -> Vec<LabeledGroup> {
    groups
        .iter()
        .map(|group| LabeledGroup {
            id: group.id,
            block_number: group.block_number,
            description: group.description.clone(),
            touch_address_map: group
                .touch_address_map
                .iter()
                .map(|(address, touch)| {
                    (
                        *address,
                        LabeledTouch {
                            touch: touch.clone(),
                            label: labels.lookup(address),
                        },
                    )
                })
                .collect(),
        })
        .collect()
}
