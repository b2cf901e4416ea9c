//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Everything here is fatal for a run except [`EngineError`], which the replay
//! driver treats as a per-block recoverable failure.

use thiserror::Error;

/// Errors that can occur during JSON-RPC communication with the archive node
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("RPC method not supported by this endpoint: {0}")]
    MethodNotSupported(String),
}

/// Errors raised by an execution engine while replaying a block
///
/// All variants are recoverable: the driver logs them and moves on to the
/// next block number.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("State for the parent of block {block} is unavailable: {reason}")]
    StateUnavailable { block: u64, reason: String },

    #[error("Processing block {block} failed: {reason}")]
    ProcessingFailed { block: u64, reason: String },

    #[error("Touch event stream closed by the consumer")]
    StreamClosed,

    #[error("Engine task panicked: {0}")]
    Panicked(String),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

/// Errors that can occur while loading or classifying candidate groups
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("Failed to read candidate file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid candidate JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No candidate files given")]
    NoInput,
}

/// Errors that can occur while building the label table
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid label JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while loading a run configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
