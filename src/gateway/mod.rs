use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokensync_types::{to_decimal_amount, TokenMetadata, TokenRecord};
use tracing::debug;

use crate::error::{GatewayErrorKind, Result, SyncError};

pub mod abi;

/// Resolves token metadata and balances from the chain.
///
/// The synchronizer only ever talks to the network through this seam, so
/// tests and alternative backends swap in freely.
#[async_trait]
pub trait BlockchainGateway: Send + Sync {
    /// Resolves metadata for a candidate token address. `Ok(None)` means the
    /// address does not answer as a token on that network; `Err` means the
    /// lookup itself could not be carried out.
    async fn resolve_token(&self, candidate: &str, network: &str)
        -> Result<Option<TokenMetadata>>;

    /// Fetches the current balance for a tracked token, already scaled by
    /// its decimals.
    async fn fetch_balance(&self, record: &TokenRecord) -> Result<String>;
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct RpcResponse {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// JSON-RPC backed gateway speaking the ERC-20 read interface
/// (`decimals()`, `symbol()`, `name()`, `balanceOf(address)`).
pub struct RpcGateway {
    client: Client,
    endpoints: HashMap<String, String>,
}

impl RpcGateway {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoints: HashMap::new(),
        })
    }

    /// Registers the RPC endpoint serving a network.
    pub fn with_endpoint(mut self, network: impl Into<String>, url: impl Into<String>) -> Self {
        self.endpoints.insert(network.into(), url.into());
        self
    }

    fn endpoint(&self, network: &str) -> Result<&str> {
        self.endpoints
            .get(network)
            .map(String::as_str)
            .ok_or_else(|| {
                SyncError::gateway(
                    GatewayErrorKind::Other,
                    format!("no RPC endpoint configured for network {}", network),
                )
            })
    }

    async fn eth_call(&self, network: &str, to: &str, data: String) -> Result<String> {
        let url = self.endpoint(network)?;
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: json!([{ "to": to, "data": data }, "latest"]),
        };

        let raw = self.client.post(url).json(&request).send().await?;
        if !raw.status().is_success() {
            let status = raw.status();
            let message = raw
                .text()
                .await
                .unwrap_or_else(|_| "unreadable body".to_string());
            return Err(SyncError::HttpError { status, message });
        }

        let response: RpcResponse = raw.json().await?;
        if let Some(err) = response.error {
            return Err(SyncError::rpc(err.code, err.message));
        }
        match response.result {
            Some(serde_json::Value::String(hex_data)) => Ok(hex_data),
            other => Err(SyncError::gateway(
                GatewayErrorKind::MalformedResponse,
                format!("unexpected eth_call result: {:?}", other),
            )),
        }
    }
}

#[async_trait]
impl BlockchainGateway for RpcGateway {
    async fn resolve_token(
        &self,
        candidate: &str,
        network: &str,
    ) -> Result<Option<TokenMetadata>> {
        if !abi::is_address(candidate) {
            debug!(candidate = %candidate, "Candidate is not address-shaped, skipping resolution");
            return Ok(None);
        }
        let address = candidate.to_lowercase();

        // A contract that does not answer decimals() cannot be tracked as a
        // token. A rejected call means "not a token", not a gateway failure.
        let decimals_data = abi::encode_call(abi::SELECTOR_DECIMALS);
        let decimals = match self.eth_call(network, &address, decimals_data).await {
            Ok(data) => match abi::decode_u8(&data) {
                Ok(value) => value,
                Err(_) => return Ok(None),
            },
            Err(SyncError::Rpc { code, message }) => {
                debug!(address = %address, code, message = %message, "decimals() call rejected");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let symbol = match self
            .eth_call(network, &address, abi::encode_call(abi::SELECTOR_SYMBOL))
            .await
        {
            Ok(data) => abi::decode_string(&data).unwrap_or_default(),
            Err(SyncError::Rpc { .. }) => String::new(),
            Err(e) => return Err(e),
        };

        let name = match self
            .eth_call(network, &address, abi::encode_call(abi::SELECTOR_NAME))
            .await
        {
            Ok(data) => abi::decode_string(&data).unwrap_or_default(),
            Err(SyncError::Rpc { .. }) => String::new(),
            Err(e) => return Err(e),
        };

        Ok(Some(TokenMetadata {
            address,
            symbol,
            name,
            decimals,
        }))
    }

    async fn fetch_balance(&self, record: &TokenRecord) -> Result<String> {
        let data = abi::encode_call_address(abi::SELECTOR_BALANCE_OF, &record.owner_address)?;
        let raw = self.eth_call(&record.network, &record.address, data).await?;
        let amount = abi::decode_uint(&raw)?;
        Ok(to_decimal_amount(&amount, record.decimals))
    }
}
