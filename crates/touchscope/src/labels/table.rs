//! Label table.
//!
//! Two feeds are merged into one lookup keyed by lower-cased address:
//! token records and account records. Only mainnet records are kept. The
//! first record seen for an address decides its kind; later records append
//! their label and overwrite the scalar fields they carry.

use crate::utils::config::MAINNET_CHAIN_ID;
use crate::utils::error::LabelError;
use alloy_primitives::{hex, Address};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One record of the token label feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLabel {
    pub address: String,
    pub chain_id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
}

/// One record of the account label feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLabel {
    pub address: String,
    pub chain_id: u64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub name_tag: String,
}

/// Where an address's label came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Token,
    Account,
    #[default]
    Unknown,
}

/// Everything known about one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelInfo {
    /// All labels, in ingestion order
    pub labels: Vec<String>,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    pub kind: LabelKind,
}

/// Lookup from lower-cased address to [`LabelInfo`]
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    entries: HashMap<String, LabelInfo>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from optional token and account feed files
    ///
    /// **Public** - used by the analyse command
    ///
    /// # Errors
    /// * `LabelError::Io` - a feed file cannot be opened
    /// * `LabelError::Json` - a feed file is not a JSON array of records
    pub fn from_files(
        tokens: Option<&Path>,
        accounts: Option<&Path>,
    ) -> Result<Self, LabelError> {
        let mut table = Self::new();

        if let Some(path) = tokens {
            let records: Vec<TokenLabel> = read_feed(path)?;
            let kept = table.ingest_tokens(&records);
            info!("Loaded {} of {} token labels from {}", kept, records.len(), path.display());
        }

        if let Some(path) = accounts {
            let records: Vec<AccountLabel> = read_feed(path)?;
            let kept = table.ingest_accounts(&records);
            info!("Loaded {} of {} account labels from {}", kept, records.len(), path.display());
        }

        Ok(table)
    }

    /// Merge token records, returning how many were ingested
    pub fn ingest_tokens(&mut self, records: &[TokenLabel]) -> usize {
        let mut kept = 0;
        for record in records.iter().filter(|r| r.chain_id == MAINNET_CHAIN_ID) {
            let info = self.entry(&record.address, LabelKind::Token);
            info.labels.push(record.label.clone());
            info.name = record.name.clone();
            info.symbol = record.symbol.clone();
            kept += 1;
        }
        kept
    }

    /// Merge account records, returning how many were ingested
    pub fn ingest_accounts(&mut self, records: &[AccountLabel]) -> usize {
        let mut kept = 0;
        for record in records.iter().filter(|r| r.chain_id == MAINNET_CHAIN_ID) {
            let info = self.entry(&record.address, LabelKind::Account);
            info.labels.push(record.label.clone());
            info.tag = record.name_tag.clone();
            kept += 1;
        }
        kept
    }

    /// Label info for `address`, `Unknown` with no labels when absent
    pub fn lookup(&self, address: &Address) -> LabelInfo {
        self.lookup_str(&hex::encode_prefixed(address))
    }

    /// Label info for a textual address, compared case-insensitively
    pub fn lookup_str(&self, address: &str) -> LabelInfo {
        self.entries
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&mut self, address: &str, kind: LabelKind) -> &mut LabelInfo {
        self.entries
            .entry(address.to_lowercase())
            .or_insert_with(|| LabelInfo {
                kind,
                ..Default::default()
            })
    }
}

fn read_feed<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, LabelError> {
    debug!("Reading label feed: {}", path.display());

    let file = File::open(path).map_err(|source| LabelError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| LabelError::Json {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    fn token(address: &str, chain_id: u64, label: &str, symbol: &str) -> TokenLabel {
        TokenLabel {
            address: address.to_string(),
            chain_id,
            label: label.to_string(),
            name: format!("{} token", symbol),
            symbol: symbol.to_string(),
        }
    }

    #[test]
    fn test_labels_append_and_scalars_overwrite() {
        let mut table = LabelTable::new();
        table.ingest_tokens(&[token(WETH, 1, "erc20", "WETH"), token(WETH, 1, "wrapped", "WETH9")]);
        table.ingest_accounts(&[AccountLabel {
            address: WETH.to_lowercase(),
            chain_id: 1,
            label: "defi".to_string(),
            name_tag: "Wrapped Ether".to_string(),
        }]);

        let info = table.lookup_str(WETH);
        assert_eq!(info.labels, vec!["erc20", "wrapped", "defi"]);
        assert_eq!(info.symbol, "WETH9");
        assert_eq!(info.tag, "Wrapped Ether");
        assert_eq!(info.kind, LabelKind::Token);
    }

    #[test]
    fn test_every_record_appends_its_label() {
        let mut table = LabelTable::new();
        table.ingest_tokens(&[token(WETH, 1, "erc20", "WETH"), token(WETH, 1, "", "WETH")]);

        assert_eq!(table.lookup_str(WETH).labels, vec!["erc20", ""]);
    }

    #[test]
    fn test_non_mainnet_records_ignored() {
        let mut table = LabelTable::new();
        let kept = table.ingest_tokens(&[token(WETH, 137, "erc20", "WETH")]);

        assert_eq!(kept, 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_lookup_by_address_is_case_insensitive() {
        let mut table = LabelTable::new();
        table.ingest_tokens(&[token(WETH, 1, "erc20", "WETH")]);

        let address: Address = WETH.parse().unwrap();
        assert_eq!(table.lookup(&address).symbol, "WETH");
    }

    #[test]
    fn test_unknown_address_defaults() {
        let info = LabelTable::new().lookup(&Address::repeat_byte(0x11));
        assert_eq!(info.kind, LabelKind::Unknown);
        assert!(info.labels.is_empty());
    }
}
