//! Execution engine backed by an archive node's debug tracer.
//!
//! Re-execution happens on the node: `debug_traceBlockByNumber` replays the
//! block on top of its parent state and returns struct logs, which are turned
//! into touch events locally.

use super::struct_log::{walk_transaction, TxContext};
use super::ExecutionEngine;
use crate::replay::TouchSink;
use crate::rpc::{parse_quantity, RpcBlock, RpcClient};
use crate::utils::error::{EngineError, RpcError};
use alloy_primitives::{Address, B256};
use log::{debug, info, warn};

/// Resolved parent of a replayed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentState {
    pub number: u64,
    pub hash: B256,
}

/// [`ExecutionEngine`] that re-executes blocks through JSON-RPC
pub struct RpcEngine {
    client: RpcClient,
}

impl RpcEngine {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    fn fetch_block(&self, number: u64) -> Result<Option<RpcBlock>, RpcError> {
        self.client.get_block_by_number(number)
    }

    fn created_address(&self, block_number: u64, tx: &TxContext) -> Option<Address> {
        match self.client.get_transaction_receipt(&tx.hash) {
            Ok(Some(receipt)) => receipt.contract_address,
            Ok(None) => {
                warn!("Block {}: no receipt for creation tx {}", block_number, tx.hash);
                None
            }
            Err(e) => {
                warn!("Block {}: receipt of {} unavailable: {}", block_number, tx.hash, e);
                None
            }
        }
    }
}

impl ExecutionEngine for RpcEngine {
    type State = ParentState;

    fn resolve_parent_state(&self, block_number: u64) -> Result<ParentState, EngineError> {
        let parent_number = block_number
            .checked_sub(1)
            .ok_or_else(|| EngineError::StateUnavailable {
                block: block_number,
                reason: "genesis block has no parent".to_string(),
            })?;

        let parent = self
            .fetch_block(parent_number)
            .map_err(|e| EngineError::StateUnavailable {
                block: block_number,
                reason: e.to_string(),
            })?
            .ok_or_else(|| EngineError::StateUnavailable {
                block: block_number,
                reason: format!("parent block {} not found", parent_number),
            })?;

        debug!("Parent of block {} is {}", block_number, parent.hash);

        Ok(ParentState {
            number: parent_number,
            hash: parent.hash,
        })
    }

    fn process_block(
        &self,
        block_number: u64,
        parent_state: ParentState,
        sink: TouchSink,
    ) -> Result<(), EngineError> {
        // Step 1: block body, checked against the resolved parent
        let block = self
            .fetch_block(block_number)?
            .ok_or_else(|| EngineError::ProcessingFailed {
                block: block_number,
                reason: "block not found".to_string(),
            })?;

        let reported_number = parse_quantity(&block.number)?;
        if reported_number != block_number || block.parent_hash != parent_state.hash {
            return Err(EngineError::StateUnavailable {
                block: block_number,
                reason: format!(
                    "parent hash mismatch: expected {} got {}",
                    parent_state.hash, block.parent_hash
                ),
            });
        }

        // Step 2: traces
        let traces = self.client.debug_trace_block_by_number(block_number)?;
        if traces.len() != block.transactions.len() {
            return Err(EngineError::ProcessingFailed {
                block: block_number,
                reason: format!(
                    "{} traces for {} transactions",
                    traces.len(),
                    block.transactions.len()
                ),
            });
        }

        info!(
            "Tracing block {}: {} transactions",
            block_number,
            block.transactions.len()
        );

        // Step 3: walk and emit
        let mut emitted = 0usize;
        for (transaction, trace) in block.transactions.iter().zip(traces) {
            if sink.is_cancelled() {
                debug!("Block {}: consumer gone, stopping early", block_number);
                return Err(EngineError::StreamClosed);
            }

            if let Some(traced_hash) = trace.tx_hash {
                if traced_hash != transaction.hash {
                    return Err(EngineError::ProcessingFailed {
                        block: block_number,
                        reason: format!(
                            "trace order mismatch: {} vs {}",
                            traced_hash, transaction.hash
                        ),
                    });
                }
            }

            let mut context = TxContext {
                hash: transaction.hash,
                from: transaction.from,
                to: transaction.to,
                created: None,
            };
            if context.to.is_none() {
                context.created = self.created_address(block_number, &context);
            }

            for event in walk_transaction(&context, &trace.result.struct_logs) {
                sink.emit(event)?;
                emitted += 1;
            }
        }

        debug!("Block {}: emitted {} touch events", block_number, emitted);
        Ok(())
    }
}
