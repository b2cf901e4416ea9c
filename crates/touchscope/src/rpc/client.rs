//! Blocking HTTP client for an Ethereum archive node.

use super::types::{BlockTraceEntry, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcBlock, RpcReceipt};
use crate::utils::config::DEFAULT_RPC_TIMEOUT;
use crate::utils::error::RpcError;
use alloy_primitives::TxHash;
use log::debug;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC client used by the replay engine
pub struct RpcClient {
    client: Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client with the default timeout
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(rpc_url, DEFAULT_RPC_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout
    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RpcError::RequestFailed)?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Perform one JSON-RPC call
    ///
    /// # Returns
    /// `Ok(None)` when the node answers with a `null` result
    ///
    /// # Errors
    /// * `RpcError::RequestFailed` - transport or body decoding failure
    /// * `RpcError::InvalidResponse` - non-2xx status or JSON-RPC error object
    /// * `RpcError::MethodNotSupported` - endpoint lacks the method (e.g. no debug namespace)
    pub fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, params, id);

        debug!("RPC request: {} {}", request.method, request.params);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .map_err(RpcError::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "HTTP {}: {}",
                status,
                response.text().unwrap_or_default()
            )));
        }

        let rpc_response: JsonRpcResponse<T> = response.json().map_err(RpcError::RequestFailed)?;

        if let Some(error) = rpc_response.error {
            return Err(map_rpc_error(error, method));
        }

        Ok(rpc_response.result)
    }

    /// `eth_getBlockByNumber` with full transaction objects
    pub fn get_block_by_number(&self, number: u64) -> Result<Option<RpcBlock>, RpcError> {
        self.call(
            "eth_getBlockByNumber",
            serde_json::json!([format_quantity(number), true]),
        )
    }

    /// `eth_getTransactionReceipt`
    pub fn get_transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<RpcReceipt>, RpcError> {
        self.call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
    }

    /// `debug_traceBlockByNumber` with the default struct logger
    ///
    /// Memory and storage capture are disabled; only opcodes, depth and stack
    /// are needed to recover touched slots.
    pub fn debug_trace_block_by_number(&self, number: u64) -> Result<Vec<BlockTraceEntry>, RpcError> {
        let params = serde_json::json!([
            format_quantity(number),
            {
                "disableMemory": true,
                "disableStorage": true,
                "disableReturnData": true
            }
        ]);

        self.call("debug_traceBlockByNumber", params)?
            .ok_or_else(|| RpcError::NotFound(format!("trace of block {}", number)))
    }
}

/// Encode a block number as a JSON-RPC hex quantity
pub fn format_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Decode a JSON-RPC hex quantity
pub fn parse_quantity(value: &str) -> Result<u64, RpcError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);

    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("bad quantity {:?}: {}", value, e)))
}

/// Map JSON-RPC error to our error type
fn map_rpc_error(error: JsonRpcError, method: &str) -> RpcError {
    match error.code {
        -32000 => {
            if error.message.to_lowercase().contains("not found") {
                RpcError::NotFound(error.message)
            } else {
                RpcError::InvalidResponse(error.message)
            }
        }
        -32601 => RpcError::MethodNotSupported(method.to_string()),
        _ => RpcError::InvalidResponse(format!("{}: {}", error.code, error.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_round_trip() {
        assert_eq!(format_quantity(0), "0x0");
        assert_eq!(format_quantity(12_965_000), "0xc5d488");
        assert_eq!(parse_quantity("0xc5d488").unwrap(), 12_965_000);
        assert_eq!(parse_quantity("ff").unwrap(), 255);
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_map_rpc_error() {
        let missing = JsonRpcError {
            code: -32000,
            message: "header not found".to_string(),
            data: None,
        };
        assert!(matches!(map_rpc_error(missing, "eth_call"), RpcError::NotFound(_)));

        let unsupported = JsonRpcError {
            code: -32601,
            message: "the method debug_traceBlockByNumber does not exist".to_string(),
            data: None,
        };
        assert!(matches!(
            map_rpc_error(unsupported, "debug_traceBlockByNumber"),
            RpcError::MethodNotSupported(m) if m == "debug_traceBlockByNumber"
        ));
    }
}
