//! Output writers and report envelopes.

pub mod json;
pub mod report;

pub use json::{read_touch_report, write_json};
pub use report::{LabeledGroupReport, RankingReport, TouchReport};
