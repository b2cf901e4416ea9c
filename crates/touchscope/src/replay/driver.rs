//! Replay driver.
//!
//! Walks a block range strictly in order. For every registered block it:
//! 1. Resolves the parent state
//! 2. Opens a fresh touch stream
//! 3. Starts the engine on the blocking pool
//! 4. Drains the stream into the attribution resolver
//! 5. Freezes the block's groups

use super::stream::{touch_stream, DrainStatus};
use crate::aggregator::{AggregationStore, AttributionResolver, AttributionStats, BlockFinish};
use crate::candidate::{LoadedCandidates, RegisteredSet};
use crate::engine::ExecutionEngine;
use crate::utils::config::DEFAULT_QUEUE_CAPACITY;
use crate::utils::error::EngineError;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Tuning knobs for a replay run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Capacity of each block's touch queue
    pub queue_capacity: usize,

    /// Abandon a block whose engine call has not finished in time
    pub block_timeout: Option<Duration>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            block_timeout: None,
        }
    }
}

/// All per-run replay state, passed explicitly through the pipeline
#[derive(Debug, Clone, Default)]
pub struct ReplayContext {
    pub registered: RegisteredSet,
    pub store: AggregationStore,
}

impl ReplayContext {
    pub fn new(loaded: LoadedCandidates) -> Self {
        Self {
            registered: loaded.registered,
            store: AggregationStore::new(loaded.groups),
        }
    }
}

/// Statistics of one replayed block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    /// Events taken off the queue
    pub delivered: u64,
    pub attribution: AttributionStats,
    pub elapsed: Duration,
}

/// How the replay of one block ended
#[derive(Debug)]
pub enum BlockOutcome {
    /// Not a registered block; the engine was never invoked
    Skipped,
    Completed(BlockStats),
    /// State resolution or execution failed; touches delivered so far are kept
    Failed { stats: BlockStats, error: EngineError },
    TimedOut(BlockStats),
    Cancelled(BlockStats),
}

impl BlockOutcome {
    pub fn stats(&self) -> Option<&BlockStats> {
        match self {
            Self::Skipped => None,
            Self::Completed(stats) | Self::TimedOut(stats) | Self::Cancelled(stats) => Some(stats),
            Self::Failed { stats, .. } => Some(stats),
        }
    }
}

/// Totals over a replayed range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub blocks_scanned: u64,
    pub blocks_replayed: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub events_delivered: u64,
    pub events_attributed: u64,
    pub events_discarded: u64,
    /// Run stopped before reaching the end of the range
    pub halted_early: bool,
}

impl ReplaySummary {
    fn record(&mut self, outcome: &BlockOutcome) {
        self.blocks_scanned += 1;
        if let Some(stats) = outcome.stats() {
            self.blocks_replayed += 1;
            self.events_delivered += stats.delivered;
            self.events_attributed += stats.attribution.attributed;
            self.events_discarded += stats.attribution.discarded;
        }
        match outcome {
            BlockOutcome::Skipped => {}
            BlockOutcome::Completed(_) => self.completed += 1,
            BlockOutcome::Failed { .. } => self.failed += 1,
            BlockOutcome::TimedOut(_) => self.timed_out += 1,
            BlockOutcome::Cancelled(_) => self.cancelled += 1,
        }
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Scanned: {} | Replayed: {} | Completed: {} | Failed: {} | Timed out: {} | Events: {} ({} attributed)",
            self.blocks_scanned,
            self.blocks_replayed,
            self.completed,
            self.failed,
            self.timed_out,
            self.events_delivered,
            self.events_attributed
        )
    }
}

/// Sequential block replayer
pub struct ReplayDriver<E: ExecutionEngine> {
    engine: Arc<E>,
    options: ReplayOptions,
    cancel: CancellationToken,
}

impl<E: ExecutionEngine> ReplayDriver<E> {
    pub fn new(engine: Arc<E>, options: ReplayOptions) -> Self {
        Self {
            engine,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned run-wide cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replay every block in `first..=last`, in order
    ///
    /// **Public** - main entry point of the replay pipeline
    ///
    /// Engine failures never abort the range; cancellation stops it before
    /// the next block.
    pub async fn replay_range(&self, ctx: &mut ReplayContext, first: u64, last: u64) -> ReplaySummary {
        let mut summary = ReplaySummary::default();
        info!("Replaying blocks {}..={}", first, last);

        for block_number in first..=last {
            if self.cancel.is_cancelled() {
                warn!("Replay halted before block {}", block_number);
                summary.halted_early = true;
                break;
            }

            let outcome = self.replay_block(ctx, block_number).await;
            summary.record(&outcome);

            if matches!(outcome, BlockOutcome::Cancelled(_)) {
                summary.halted_early = true;
                break;
            }
        }

        info!("Replay finished: {}", summary.summary());
        summary
    }

    /// Replay a single block
    ///
    /// **Public** - unregistered blocks return `Skipped` without touching the engine
    pub async fn replay_block(&self, ctx: &mut ReplayContext, block_number: u64) -> BlockOutcome {
        if !ctx.registered.contains_block(block_number) {
            return BlockOutcome::Skipped;
        }

        let started = Instant::now();
        let group_ids = ctx.registered.groups_in_block(block_number).to_vec();
        info!("Replaying block {} ({} groups)", block_number, group_ids.len());

        // Step 1: parent state
        let parent_state = match self.resolve_parent_state(block_number).await {
            Ok(state) => state,
            Err(error) => {
                warn!("Skipping block {}: {}", block_number, error);
                ctx.store.finish_block(&group_ids, BlockFinish::Failed);
                return BlockOutcome::Failed {
                    stats: BlockStats {
                        elapsed: started.elapsed(),
                        ..Default::default()
                    },
                    error,
                };
            }
        };

        // Step 2: block-scoped stream
        let block_cancel = self.cancel.child_token();
        let (sink, stream) = touch_stream(self.options.queue_capacity, block_cancel);

        // Step 3: producer
        let engine = Arc::clone(&self.engine);
        let producer = tokio::task::spawn_blocking(move || {
            engine.process_block(block_number, parent_state, sink)
        });
        let completion = async move {
            match producer.await {
                Ok(result) => result,
                Err(join_error) => Err(EngineError::Panicked(join_error.to_string())),
            }
        };

        // Step 4: consumer
        let ReplayContext { registered, store } = ctx;
        let mut resolver = AttributionResolver::new(registered, store);
        let report = stream
            .drain(completion, self.options.block_timeout, |event| {
                resolver.attribute(&event);
            })
            .await;

        let stats = BlockStats {
            delivered: report.delivered,
            attribution: resolver.stats(),
            elapsed: started.elapsed(),
        };

        debug!(
            "Block {}: {} events, {} attributed, {} discarded in {:.2}s",
            block_number,
            stats.delivered,
            stats.attribution.attributed,
            stats.attribution.discarded,
            stats.elapsed.as_secs_f64()
        );

        // Step 5: freeze
        match report.status {
            DrainStatus::Completed(Ok(())) => {
                store.finish_block(&group_ids, BlockFinish::Completed);
                info!("✓ Block {} done ({} touches attributed)", block_number, stats.attribution.attributed);
                BlockOutcome::Completed(stats)
            }
            DrainStatus::Completed(Err(error)) => {
                warn!(
                    "Block {} failed after {} events: {}",
                    block_number, stats.delivered, error
                );
                store.finish_block(&group_ids, BlockFinish::Failed);
                BlockOutcome::Failed { stats, error }
            }
            DrainStatus::TimedOut => {
                warn!("Block {} abandoned after {:.2}s", block_number, stats.elapsed.as_secs_f64());
                store.finish_block(&group_ids, BlockFinish::Abandoned);
                BlockOutcome::TimedOut(stats)
            }
            DrainStatus::Cancelled => {
                warn!("Block {} cancelled", block_number);
                store.finish_block(&group_ids, BlockFinish::Abandoned);
                BlockOutcome::Cancelled(stats)
            }
        }
    }

    async fn resolve_parent_state(&self, block_number: u64) -> Result<E::State, EngineError> {
        if block_number == 0 {
            return Err(EngineError::StateUnavailable {
                block: block_number,
                reason: "genesis block has no parent".to_string(),
            });
        }

        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.resolve_parent_state(block_number))
            .await
            .map_err(|join_error| EngineError::Panicked(join_error.to_string()))?
    }
}
