//! Block replay pipeline.
//!
//! A per-block producer/consumer pair: the execution engine emits touch
//! events into a bounded stream, and the driver drains them into the
//! aggregation store before moving on to the next block.

pub mod driver;
pub mod stream;

pub use driver::{BlockOutcome, BlockStats, ReplayContext, ReplayDriver, ReplayOptions, ReplaySummary};
pub use stream::{touch_stream, DrainReport, DrainStatus, TouchEvent, TouchSink, TouchStream};
