use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::Path;
use tokensync_types::TokenMetadata;
use tracing::{debug, info};

use crate::error::Result;

/// Local source of known tokens, partitioned by network.
///
/// Searched before any remote lookup; an implementation may be backed by a
/// bundled token list, persisted user data, or anything else that answers
/// without touching the chain.
#[async_trait]
pub trait TokenCatalog: Send + Sync {
    /// Lists every known token for the given network. An unknown network
    /// yields an empty list, never an error.
    async fn list_known(&self, network: &str) -> Vec<TokenMetadata>;
}

/// In-memory reference catalog, loadable from a JSON file keyed by network.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    networks: DashMap<String, Vec<TokenMetadata>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self {
            networks: DashMap::new(),
        }
    }

    /// Parses a catalog document: a JSON object mapping network id to its
    /// token list.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, Vec<TokenMetadata>> = serde_json::from_str(raw)?;
        let catalog = Self::new();
        for (network, tokens) in parsed {
            info!(network = %network, tokens = tokens.len(), "Loaded catalog entries");
            catalog.networks.insert(network, tokens);
        }
        Ok(catalog)
    }

    /// Loads a catalog document from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    /// Registers or replaces the token list for a network.
    pub fn insert_network(&self, network: impl Into<String>, tokens: Vec<TokenMetadata>) {
        self.networks.insert(network.into(), tokens);
    }
}

#[async_trait]
impl TokenCatalog for StaticCatalog {
    async fn list_known(&self, network: &str) -> Vec<TokenMetadata> {
        match self.networks.get(network) {
            Some(entry) => entry.value().clone(),
            None => {
                debug!(network = %network, "No catalog entries for network");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dai() -> TokenMetadata {
        TokenMetadata {
            address: "0xA".to_string(),
            symbol: "DAI".to_string(),
            name: "Dai".to_string(),
            decimals: 18,
        }
    }

    #[tokio::test]
    async fn lists_registered_tokens() {
        let catalog = StaticCatalog::new();
        catalog.insert_network("eth", vec![dai()]);

        let known = catalog.list_known("eth").await;
        assert_eq!(known, vec![dai()]);
    }

    #[tokio::test]
    async fn unknown_network_is_empty_not_an_error() {
        let catalog = StaticCatalog::new();
        assert!(catalog.list_known("ropsten").await.is_empty());
    }

    #[tokio::test]
    async fn parses_json_document_keyed_by_network() {
        let raw = r#"{
            "eth": [
                {"address": "0xA", "symbol": "DAI", "name": "Dai", "decimals": 18}
            ],
            "gno": []
        }"#;

        let catalog = StaticCatalog::from_json(raw).unwrap();
        assert_eq!(catalog.list_known("eth").await, vec![dai()]);
        assert!(catalog.list_known("gno").await.is_empty());
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(StaticCatalog::from_json("not json").is_err());
    }
}
