//! Replay command implementation.
//!
//! The replay command:
//! 1. Loads and registers candidate groups
//! 2. Connects the execution engine
//! 3. Replays the block range
//! 4. Writes the visited groups

use super::models::ReplayArgs;
use crate::candidate::load_candidates;
use crate::engine::{ExecutionEngine, RpcEngine};
use crate::output::{write_json, TouchReport};
use crate::replay::{ReplayContext, ReplayDriver, ReplayOptions, ReplaySummary};
use crate::rpc::RpcClient;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Execute the replay command against the configured archive node
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Candidate file read or parse failures
/// * Invalid configuration
/// * RPC client construction failure
/// * Output write failures
pub fn execute_replay(args: ReplayArgs) -> Result<ReplaySummary> {
    info!("RPC endpoint: {}", args.config.rpc_url());
    let client = RpcClient::with_timeout(args.config.rpc_url(), args.config.rpc_timeout())
        .context("Failed to create RPC client")?;

    execute_replay_with_engine(args, Arc::new(RpcEngine::new(client)))
}

/// Execute the replay command with any execution engine
///
/// **Public** - lets callers plug in their own engine
pub fn execute_replay_with_engine<E: ExecutionEngine>(
    args: ReplayArgs,
    engine: Arc<E>,
) -> Result<ReplaySummary> {
    let start_time = Instant::now();
    validate_args(&args)?;
    let (first, last) = args.config.block_range()?;

    // Step 1: candidates
    info!("Step 1/4: Loading candidates...");
    let loaded = load_candidates(&args.candidates).context("Failed to load candidates")?;
    info!(
        "Registered {} groups over {} blocks ({} rejected)",
        loaded.groups.len(),
        loaded.registered.block_count(),
        loaded.rejected
    );
    let mut ctx = ReplayContext::new(loaded);

    // Step 2: runtime and cancellation
    info!("Step 2/4: Starting replay runtime...");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let cancel = CancellationToken::new();
    let options = ReplayOptions {
        queue_capacity: args.config.queue_capacity(),
        block_timeout: args.config.block_timeout(),
    };
    debug!("Replay options: {:?}", options);
    let driver = ReplayDriver::new(engine, options).with_cancellation(cancel.clone());

    // Step 3: replay
    info!("Step 3/4: Replaying blocks {}..={}...", first, last);
    let summary = runtime.block_on(async {
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.cancelled() => {}
                result = tokio::signal::ctrl_c() => {
                    if result.is_ok() {
                        warn!("Interrupted, finishing with the groups visited so far");
                        interrupt.cancel();
                    }
                }
            }
        });

        let summary = driver.replay_range(&mut ctx, first, last).await;
        // Releases the signal listener
        cancel.cancel();
        summary
    });
    // Engine tasks of abandoned blocks are not waited for
    runtime.shutdown_background();

    // Step 4: output
    info!("Step 4/4: Writing output...");
    let visited = ctx.store.into_visited();
    let report = TouchReport::new(first, last, visited);
    write_json(&report, &args.output).context("Failed to write touch report")?;
    info!("✓ Touch report written to: {}", args.output.display());

    if args.print_summary {
        print_summary(&summary, &report);
    }

    info!("Replay completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(summary)
}

/// Validate replay arguments
///
/// **Public** - can be called before execute_replay for early validation
pub fn validate_args(args: &ReplayArgs) -> Result<()> {
    if args.candidates.is_empty() {
        anyhow::bail!("At least one candidate file is required");
    }

    args.config.validate().context("Invalid run configuration")?;
    args.config.block_range()?;

    Ok(())
}

fn print_summary(summary: &ReplaySummary, report: &TouchReport) {
    println!("\n{}", "=".repeat(80));
    println!("REPLAY SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Blocks:          {}..={}", report.first_block, report.last_block);
    println!("Blocks replayed: {}", summary.blocks_replayed);
    println!("  completed:     {}", summary.completed);
    println!("  failed:        {}", summary.failed);
    println!("  timed out:     {}", summary.timed_out);
    println!("Touch events:    {} ({} attributed)", summary.events_delivered, summary.events_attributed);
    println!("Visited groups:  {}", report.groups.len());
    if summary.halted_early {
        println!("Run was interrupted before the end of the range");
    }
    println!("{}", "=".repeat(80));
}
