//! Execution engine contract and the JSON-RPC backed implementation.
//!
//! The replay pipeline treats the engine as an opaque, trusted source of
//! touch events. Anything that can re-execute a historical block on top of
//! its parent state and report storage/account accesses can plug in here.

pub mod rpc_engine;
pub mod struct_log;

pub use rpc_engine::{ParentState, RpcEngine};
pub use struct_log::{walk_transaction, StructLog, TxContext};

use crate::replay::TouchSink;
use crate::utils::error::EngineError;

/// A block execution engine
///
/// Both methods are called from tokio's blocking pool and may block freely.
/// The engine handle is shared across all sequential block replays.
pub trait ExecutionEngine: Send + Sync + 'static {
    /// Handle to the pre-state of a block (post-state of its parent)
    type State: Send + 'static;

    /// Resolve the post-state of block `block_number - 1`
    ///
    /// # Errors
    /// * `EngineError::StateUnavailable` - the parent state cannot be located
    fn resolve_parent_state(&self, block_number: u64) -> Result<Self::State, EngineError>;

    /// Execute every transaction of `block_number` against `parent_state`
    ///
    /// Every storage or account access is reported through `sink`, duplicates
    /// included. The sink is dropped when this call returns, which closes the
    /// stream for the consumer.
    fn process_block(
        &self,
        block_number: u64,
        parent_state: Self::State,
        sink: TouchSink,
    ) -> Result<(), EngineError>;
}
