//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyse;
pub mod classify;
pub mod models;
pub mod replay;
pub mod utils;

// Re-export main command functions
pub use analyse::execute_analyse;
pub use classify::{execute_classify, CandidateFiles};
pub use models::{AnalyseArgs, ClassifyArgs, ReplayArgs};
pub use replay::{execute_replay, execute_replay_with_engine, validate_args};
pub use utils::{display_schema, display_version, validate_touch_report};
