//! JSON-RPC client for fetching blocks, receipts and struct-log traces.

pub mod client;
pub mod types;

pub use client::{format_quantity, parse_quantity, RpcClient};
pub use types::{BlockTraceEntry, RpcBlock, RpcReceipt, RpcTransaction, TxTrace};
