//! Aggregation of touch events into per-group statistics.
//!
//! This module turns the raw touch stream into:
//! - Per-group address maps (invocation count + storage key histogram)
//! - Attribution counters (kept vs. discarded events)

pub mod attribution;
pub mod store;

// Re-export main types and functions
pub use attribution::{Attribution, AttributionResolver, AttributionStats};
pub use store::{AggregationStore, BlockFinish, RejectedTouch, TouchAddress, TouchAddressMap};
