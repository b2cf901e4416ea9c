//! Post-replay analysis: rankings and label merge.
//!
//! Runs only after the whole block range has been replayed, over the
//! visited groups of a touch report.

pub mod labeled;
pub mod ranking;

pub use labeled::{label_groups, LabeledGroup, LabeledTouch};
pub use ranking::{
    commonality_ranking, invocation_ranking, key_ranking, top_share, total_invocations, RankedAddress,
    RankedKey,
};
