//! Touchscope CLI
//!
//! Replays MEV candidate blocks against an archive node and reports which
//! addresses and storage slots every candidate group touched.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use touchscope::commands::{
    display_schema, display_version, execute_analyse, execute_classify, execute_replay, AnalyseArgs,
    ClassifyArgs, ReplayArgs,
};
use touchscope::utils::config::{load_config, RunConfig};

/// Touchscope - storage touch analysis for MEV bundles
#[derive(Parser, Debug)]
#[command(name = "touchscope")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a block range and record the touches of every candidate group
    Replay {
        /// Candidate files (arbitrage, liquidation, sandwich)
        #[arg(short, long, required = true, num_args = 1..)]
        candidates: Vec<PathBuf>,

        /// First block of the range (inclusive)
        #[arg(long)]
        first: Option<u64>,

        /// Last block of the range (inclusive)
        #[arg(long)]
        last: Option<u64>,

        /// Archive node RPC endpoint
        #[arg(short, long, env = "TOUCHSCOPE_RPC_URL")]
        rpc: Option<String>,

        /// TOML run configuration; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output path for the touch report (placed in artifacts/ by default)
        #[arg(short, long, default_value = "artifacts/touched_address.json")]
        output: PathBuf,

        /// Capacity of the per-block touch queue
        #[arg(long)]
        queue_capacity: Option<usize>,

        /// Abandon a block after this many seconds
        #[arg(long)]
        block_timeout: Option<u64>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Split a cleaned MEV transaction list into candidate files
    Classify {
        /// Cleaned MEV transaction JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for the candidate files (defaults to the input's directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Rank touched addresses across groups and attach labels
    Analyse {
        /// Touch reports written by `replay`
        #[arg(short, long, required = true, num_args = 1..)]
        touched: Vec<PathBuf>,

        /// Token label feed
        #[arg(long)]
        tokens: Option<PathBuf>,

        /// Account label feed
        #[arg(long)]
        accounts: Option<PathBuf>,

        /// Output path for the ranking report
        #[arg(short, long, default_value = "artifacts/ranking.json")]
        output: PathBuf,

        /// Also write every group with labelled addresses
        #[arg(long)]
        labeled_groups: Option<PathBuf>,

        /// Number of rows to show and hot keys to keep
        #[arg(long, default_value = "20")]
        top: usize,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a touch report JSON file
    Validate {
        /// Path to touch report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Replay {
            candidates,
            first,
            last,
            rpc,
            config,
            output,
            queue_capacity,
            block_timeout,
            summary,
        } => {
            let file_config = match config {
                Some(path) => load_config(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => RunConfig::default(),
            };

            let flags = RunConfig {
                rpc_url: rpc,
                first_block: first,
                last_block: last,
                queue_capacity,
                block_timeout_secs: block_timeout,
                rpc_timeout_secs: None,
            };

            let args = ReplayArgs {
                candidates,
                config: file_config.merged_with(flags),
                output,
                print_summary: summary,
            };

            execute_replay(args)?;
        }

        Commands::Classify { input, output_dir } => {
            execute_classify(ClassifyArgs { input, output_dir })?;
        }

        Commands::Analyse {
            touched,
            tokens,
            accounts,
            output,
            labeled_groups,
            top,
            summary,
        } => {
            let args = AnalyseArgs {
                touched,
                tokens,
                accounts,
                output,
                labeled_groups,
                top_n: top,
                print_summary: summary,
            };

            execute_analyse(args)?;
        }

        Commands::Validate { file } => {
            touchscope::commands::validate_touch_report(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
