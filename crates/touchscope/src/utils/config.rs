//! Configuration and constants for the CLI.

use super::error::ConfigError;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default timeout for RPC requests
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Default RPC endpoint of the archive node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Capacity of the per-block touch event queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100_000;

/// Only label records for this chain id are ingested (Ethereum mainnet)
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Storage key recorded for account-level touches (balance, code, calls)
pub const ACCOUNT_TOUCH_KEY: B256 = B256::ZERO;

/// Upper bound on a single replay range, guards against swapped arguments
pub const MAX_BLOCK_RANGE: u64 = 10_000_000;

/// Run configuration for the replay command
///
/// Every field is optional in the TOML file; CLI flags take precedence over
/// file values, and constants above fill whatever is left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Archive node JSON-RPC endpoint
    pub rpc_url: Option<String>,

    /// First block of the replay range (inclusive)
    pub first_block: Option<u64>,

    /// Last block of the replay range (inclusive)
    pub last_block: Option<u64>,

    /// Capacity of the per-block touch event queue
    pub queue_capacity: Option<usize>,

    /// Abandon a block if its engine call has not finished after this many seconds
    pub block_timeout_secs: Option<u64>,

    /// Timeout for a single RPC request
    pub rpc_timeout_secs: Option<u64>,
}

impl RunConfig {
    /// Overlay `other` on top of `self`; values present in `other` win.
    pub fn merged_with(self, other: RunConfig) -> RunConfig {
        RunConfig {
            rpc_url: other.rpc_url.or(self.rpc_url),
            first_block: other.first_block.or(self.first_block),
            last_block: other.last_block.or(self.last_block),
            queue_capacity: other.queue_capacity.or(self.queue_capacity),
            block_timeout_secs: other.block_timeout_secs.or(self.block_timeout_secs),
            rpc_timeout_secs: other.rpc_timeout_secs.or(self.rpc_timeout_secs),
        }
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(DEFAULT_RPC_URL)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn block_timeout(&self) -> Option<Duration> {
        self.block_timeout_secs.map(Duration::from_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RPC_TIMEOUT)
    }

    /// Resolved block range, once both ends are known
    pub fn block_range(&self) -> Result<(u64, u64), ConfigError> {
        match (self.first_block, self.last_block) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(ConfigError::Invalid(
                "both first_block and last_block must be set".to_string(),
            )),
        }
    }

    /// Validate the merged configuration
    ///
    /// **Public** - called by the replay command before any engine work starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.rpc_url();
        if url.is_empty() {
            return Err(ConfigError::Invalid("RPC URL cannot be empty".to_string()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "RPC URL must start with http:// or https://".to_string(),
            ));
        }

        let (first, last) = self.block_range()?;
        if first > last {
            return Err(ConfigError::Invalid(format!(
                "first_block ({}) is greater than last_block ({})",
                first, last
            )));
        }
        if last - first >= MAX_BLOCK_RANGE {
            return Err(ConfigError::Invalid(format!(
                "block range is too large (max {} blocks)",
                MAX_BLOCK_RANGE
            )));
        }

        if self.queue_capacity() == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.block_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "block_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load a run configuration from a TOML file
///
/// # Errors
/// * `ConfigError::Io` - If file cannot be read
/// * `ConfigError::Toml` - If TOML is invalid
///
/// # Example
/// ```ignore
/// let config = load_config("replay.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: RunConfig = toml::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RunConfig {
        RunConfig {
            rpc_url: Some("http://localhost:8545".to_string()),
            first_block: Some(19_731_000),
            last_block: Some(19_733_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_toml_config() {
        let config: RunConfig = toml::from_str(
            r#"
            rpc_url = "http://archive:8545"
            first_block = 100
            last_block = 200
            queue_capacity = 512
            block_timeout_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_url(), "http://archive:8545");
        assert_eq!(config.block_range().unwrap(), (100, 200));
        assert_eq!(config.queue_capacity(), 512);
        assert_eq!(config.block_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.rpc_timeout(), DEFAULT_RPC_TIMEOUT);
    }

    #[test]
    fn test_merge_prefers_overlay() {
        let file = RunConfig {
            rpc_url: Some("http://file:8545".to_string()),
            first_block: Some(1),
            last_block: Some(10),
            ..Default::default()
        };
        let flags = RunConfig {
            last_block: Some(5),
            ..Default::default()
        };

        let merged = file.merged_with(flags);
        assert_eq!(merged.rpc_url(), "http://file:8545");
        assert_eq!(merged.block_range().unwrap(), (1, 5));
        assert_eq!(merged.queue_capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = RunConfig {
            first_block: Some(10),
            last_block: Some(9),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_range() {
        let config = RunConfig {
            last_block: None,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = RunConfig {
            rpc_url: Some("ftp://localhost:8545".to_string()),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = RunConfig {
            queue_capacity: Some(0),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }
}
