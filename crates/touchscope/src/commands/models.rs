use crate::utils::config::RunConfig;
use std::path::PathBuf;

/// Arguments for the replay command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    /// Candidate files (arbitrage, liquidation and sandwich records)
    pub candidates: Vec<PathBuf>,

    /// Effective run configuration (file values overlaid with CLI flags)
    pub config: RunConfig,

    /// Output path for the touch report
    pub output: PathBuf,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for ReplayArgs {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            config: RunConfig::default(),
            output: PathBuf::from("artifacts/touched_address.json"),
            print_summary: false,
        }
    }
}

/// Arguments for the classify command
#[derive(Debug, Clone)]
pub struct ClassifyArgs {
    /// Cleaned MEV transaction list
    pub input: PathBuf,

    /// Directory for the candidate files; defaults to the input's directory
    pub output_dir: Option<PathBuf>,
}

/// Arguments for the analyse command
#[derive(Debug, Clone)]
pub struct AnalyseArgs {
    /// Touch reports to analyse together
    pub touched: Vec<PathBuf>,

    /// Token label feed
    pub tokens: Option<PathBuf>,

    /// Account label feed
    pub accounts: Option<PathBuf>,

    /// Output path for the ranking report
    pub output: PathBuf,

    /// Output path for the labelled group report (optional)
    pub labeled_groups: Option<PathBuf>,

    /// Number of rows shown in the summary and kept in the hot key list
    pub top_n: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyseArgs {
    fn default() -> Self {
        Self {
            touched: Vec::new(),
            tokens: None,
            accounts: None,
            output: PathBuf::from("artifacts/ranking.json"),
            labeled_groups: None,
            top_n: 20,
            print_summary: false,
        }
    }
}
