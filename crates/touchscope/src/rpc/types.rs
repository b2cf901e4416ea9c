//! Types for JSON-RPC communication with an Ethereum archive node.
//!
//! Only the fields the replay engine reads are modelled; everything else in
//! the node's responses is ignored by serde.

use alloy_primitives::{Address, TxHash, B256};
use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response structure
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Block header plus full transaction objects (`eth_getBlockByNumber(n, true)`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    /// Hex quantity, e.g. `"0x10d4f"`
    pub number: String,
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// Transaction object embedded in a block
#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    pub hash: TxHash,
    pub from: Address,
    /// `None` for contract creation
    #[serde(default)]
    pub to: Option<Address>,
}

/// Subset of `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: TxHash,
    #[serde(default)]
    pub contract_address: Option<Address>,
}

/// One entry of `debug_traceBlockByNumber` with the default struct logger
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTraceEntry {
    /// Present on recent geth versions; absent on older ones
    #[serde(default)]
    pub tx_hash: Option<TxHash>,
    pub result: TxTrace,
}

/// Struct-log trace of a single transaction
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxTrace {
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub struct_logs: Vec<crate::engine::StructLog>,
}
