//! Touchscope
//!
//! Replays Ethereum blocks that contain known MEV transaction groups
//! (arbitrage, liquidation, sandwich) and measures which addresses and
//! storage slots each group touches.
//!
//! This crate provides the core implementation for the `touchscope` CLI.
//!
//! Pipeline:
//! - `candidate` loads groups and derives the registered block/transaction set
//! - `replay` drives an [`engine::ExecutionEngine`] block by block
//! - `aggregator` attributes touch events to groups
//! - `analysis` ranks addresses across groups and attaches labels

pub mod aggregator;
pub mod analysis;
pub mod candidate;
pub mod commands;
pub mod engine;
pub mod labels;
pub mod output;
pub mod replay;
pub mod rpc;
pub mod utils;
