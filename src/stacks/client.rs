//! Stacks node HTTP client with timeout and error handling.
//!
//! # Responsibilities
//! - Talk to the node's `/v2` REST API (primary + failover nodes)
//! - Evaluate read-only contract calls
//! - Look up account nonces and contract interfaces
//! - Broadcast signed transactions
//! - Provide health check for node connectivity

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::timeout;

use crate::config::NetworkConfig;
use crate::stacks::address::StacksAddress;
use crate::stacks::chain::{ChainClient, ContractCallRequest};
use crate::stacks::clarity::ClarityValue;
use crate::stacks::transaction::{ContractCall, StacksTransaction, TxBuilder};
use crate::stacks::types::{BroadcastResponse, ChainError, ChainResult};
use crate::stacks::wallet::Wallet;

#[derive(Debug, Deserialize)]
struct InfoResponse {
    network_id: u32,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    nonce: u64,
}

#[derive(Debug, Deserialize)]
struct ReadOnlyResponse {
    okay: bool,
    result: Option<String>,
    cause: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BroadcastRejection {
    error: String,
    reason: Option<String>,
    txid: Option<String>,
}

/// Public interface of a deployed contract, as served by
/// `/v2/contracts/interface`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractInterface {
    pub functions: Vec<ContractFunction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractFunction {
    pub name: String,
    pub access: String,
    pub args: Vec<FunctionArg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionArg {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: Value,
}

impl ContractInterface {
    /// Check that `function` is public and accepts `args`.
    pub fn validate_call(&self, function: &str, args: &[ClarityValue]) -> ChainResult<()> {
        let f = self
            .functions
            .iter()
            .find(|f| f.name == function)
            .ok_or_else(|| ChainError::Abi(format!("no function named '{}'", function)))?;

        if f.access != "public" {
            return Err(ChainError::Abi(format!(
                "function '{}' is {}, not public",
                function, f.access
            )));
        }
        if f.args.len() != args.len() {
            return Err(ChainError::Abi(format!(
                "function '{}' takes {} arguments, got {}",
                function,
                f.args.len(),
                args.len()
            )));
        }
        for (declared, value) in f.args.iter().zip(args) {
            if !type_matches(&declared.arg_type, value) {
                return Err(ChainError::Abi(format!(
                    "argument '{}' expects {}, got {}",
                    declared.name,
                    declared.arg_type,
                    value.type_name()
                )));
            }
        }
        Ok(())
    }
}

/// Shallow comparison of a value against an ABI type descriptor.
fn type_matches(declared: &Value, value: &ClarityValue) -> bool {
    match (declared, value) {
        (Value::String(t), ClarityValue::UInt(_)) => t == "uint128",
        (Value::String(t), ClarityValue::Int(_)) => t == "int128",
        (Value::String(t), ClarityValue::Bool(_)) => t == "bool",
        (
            Value::String(t),
            ClarityValue::StandardPrincipal(_) | ClarityValue::ContractPrincipal(..),
        ) => t == "principal" || t == "trait_reference",
        (Value::Object(map), ClarityValue::OptionalNone) => map.contains_key("optional"),
        (Value::Object(map), ClarityValue::OptionalSome(inner)) => map
            .get("optional")
            .is_some_and(|t| type_matches(t, inner)),
        (Value::Object(map), ClarityValue::Buffer(bytes)) => map
            .get("buffer")
            .and_then(|b| b.get("length"))
            .and_then(Value::as_u64)
            .is_some_and(|max| bytes.len() as u64 <= max),
        (Value::Object(map), ClarityValue::ResponseOk(_) | ClarityValue::ResponseErr(_)) => {
            map.contains_key("response")
        }
        _ => false,
    }
}

/// Stacks node client signing as a single sender.
#[derive(Clone)]
pub struct StacksClient {
    http: reqwest::Client,
    /// Base URLs (primary + failovers), without trailing slash.
    nodes: Vec<String>,
    wallet: Wallet,
    config: NetworkConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl StacksClient {
    /// Create a new client. Performs no network I/O.
    ///
    /// # Arguments
    /// * `config` - Node connection configuration
    /// * `wallet` - Sender's signing wallet
    pub fn new(config: NetworkConfig, wallet: Wallet) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut nodes = Vec::new();

        let primary: url::Url = config.node_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid node URL '{}': {}", config.node_url, e))
        })?;
        nodes.push(primary.as_str().trim_end_matches('/').to_string());

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => nodes.push(url.as_str().trim_end_matches('/').to_string()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover node URL"),
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ChainError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            nodes,
            wallet,
            config,
            timeout_duration,
        })
    }

    /// Run `op` against each node in turn until one succeeds.
    async fn with_failover<T, F, Fut>(&self, what: &str, op: F) -> ChainResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = ChainResult<T>>,
    {
        let mut last_error = None;
        for (i, node) in self.nodes.iter().enumerate() {
            match timeout(self.timeout_duration, op(node.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(node_idx = i, error = %e, "RPC error, trying next node");
                    last_error = Some(e);
                }
                Err(_) => {
                    tracing::warn!(node_idx = i, "RPC timeout, trying next node");
                    last_error = Some(ChainError::Timeout(self.config.rpc_timeout_secs));
                }
            }
        }
        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(ChainError::Rpc(format!("All Stacks nodes failed to {}: {}", what, detail)))
    }

    /// Verify the node's network matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let actual = self.get_chain_id().await?;
        let expected = self.config.network.chain_id();
        if actual != expected {
            return Err(ChainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    /// Get the chain ID the node reports.
    pub async fn get_chain_id(&self) -> ChainResult<u32> {
        let http = &self.http;
        self.with_failover("get node info", |base| async move {
            let info: InfoResponse = http
                .get(format!("{}/v2/info", base))
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ChainError::Rpc(e.to_string()))?
                .json()
                .await
                .map_err(|e| ChainError::UnexpectedResponse(e.to_string()))?;
            Ok(info.network_id)
        })
        .await
    }

    /// Get the next nonce for an account.
    pub async fn get_nonce(&self, address: &StacksAddress) -> ChainResult<u64> {
        let http = &self.http;
        let address = address.to_string();
        let address = &address;
        self.with_failover("get account nonce", |base| async move {
            let account: AccountResponse = http
                .get(format!("{}/v2/accounts/{}?proof=0", base, address))
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ChainError::Rpc(e.to_string()))?
                .json()
                .await
                .map_err(|e| ChainError::UnexpectedResponse(e.to_string()))?;
            Ok(account.nonce)
        })
        .await
    }

    /// Fetch a deployed contract's public interface.
    pub async fn get_contract_interface(
        &self,
        contract_address: &StacksAddress,
        contract_name: &str,
    ) -> ChainResult<ContractInterface> {
        let http = &self.http;
        let path = format!("v2/contracts/interface/{}/{}", contract_address, contract_name);
        let path = &path;
        self.with_failover("get contract interface", |base| async move {
            http.get(format!("{}/{}", base, path))
                .send()
                .await
                .and_then(reqwest::Response::error_for_status)
                .map_err(|e| ChainError::Rpc(e.to_string()))?
                .json::<ContractInterface>()
                .await
                .map_err(|e| ChainError::UnexpectedResponse(e.to_string()))
        })
        .await
    }

    /// Evaluate a read-only function.
    pub async fn read_only(
        &self,
        contract_address: &StacksAddress,
        contract_name: &str,
        function_name: &str,
        args: &[ClarityValue],
        sender: &StacksAddress,
    ) -> ChainResult<ClarityValue> {
        let http = &self.http;
        let path = format!(
            "v2/contracts/call-read/{}/{}/{}",
            contract_address, contract_name, function_name
        );
        let path = &path;
        let arguments = args
            .iter()
            .map(ClarityValue::to_hex)
            .collect::<Result<Vec<_>, _>>()?;
        let body = json!({
            "sender": sender.to_string(),
            "arguments": arguments,
        });
        let body = &body;

        let response: ReadOnlyResponse = self
            .with_failover("call read-only function", |base| async move {
                http.post(format!("{}/{}", base, path))
                    .json(body)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(|e| ChainError::Rpc(e.to_string()))?
                    .json::<ReadOnlyResponse>()
                    .await
                    .map_err(|e| ChainError::UnexpectedResponse(e.to_string()))
            })
            .await?;

        if !response.okay {
            return Err(ChainError::ReadOnlyFailed(
                response.cause.unwrap_or_else(|| "unknown cause".to_string()),
            ));
        }
        let result = response
            .result
            .ok_or_else(|| ChainError::UnexpectedResponse("missing result".to_string()))?;
        Ok(ClarityValue::from_hex(&result)?)
    }

    /// Broadcast a signed transaction.
    pub async fn broadcast(&self, tx: &StacksTransaction) -> ChainResult<BroadcastResponse> {
        let http = &self.http;
        let bytes = tx.serialize()?;
        let bytes = &bytes;
        let local_txid = tx.txid()?;
        let local_txid = &local_txid;

        self.with_failover("broadcast transaction", |base| async move {
            let response = http
                .post(format!("{}/v2/transactions", base))
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(bytes.clone())
                .send()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;

            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| ChainError::Rpc(e.to_string()))?;

            if status.is_success() {
                let txid: String = serde_json::from_str(&text)
                    .map_err(|e| ChainError::UnexpectedResponse(format!("{}: {}", e, text)))?;
                return Ok(BroadcastResponse::accepted(txid));
            }
            if status.is_server_error() {
                return Err(ChainError::Rpc(format!("node returned {}", status)));
            }

            let rejection: BroadcastRejection = serde_json::from_str(&text)
                .map_err(|_| ChainError::UnexpectedResponse(format!("{}: {}", status, text)))?;
            Ok(BroadcastResponse::rejected(
                rejection.txid.unwrap_or_else(|| local_txid.0.clone()),
                rejection.error,
                rejection.reason,
            ))
        })
        .await
    }

    /// Check if the node is reachable and on the configured network.
    pub async fn is_healthy(&self) -> bool {
        self.verify_chain_id().await.is_ok()
    }
}

#[async_trait]
impl ChainClient for StacksClient {
    fn sender_address(&self) -> StacksAddress {
        self.wallet.address()
    }

    async fn preflight(&self) -> ChainResult<()> {
        self.verify_chain_id().await
    }

    async fn call_read_only(
        &self,
        contract_address: &StacksAddress,
        contract_name: &str,
        function_name: &str,
        args: &[ClarityValue],
        sender: &StacksAddress,
    ) -> ChainResult<ClarityValue> {
        self.read_only(contract_address, contract_name, function_name, args, sender)
            .await
    }

    async fn submit_contract_call(
        &self,
        request: ContractCallRequest,
    ) -> ChainResult<BroadcastResponse> {
        if request.validate_with_abi {
            let interface = self
                .get_contract_interface(&request.contract_address, &request.contract_name)
                .await?;
            interface.validate_call(&request.function_name, &request.function_args)?;
        }

        let nonce = self.get_nonce(&self.wallet.address()).await?;
        let call = ContractCall {
            contract_address: request.contract_address,
            contract_name: request.contract_name,
            function_name: request.function_name,
            function_args: request.function_args,
        };
        let tx = TxBuilder::new(&self.wallet)
            .build_contract_call(call, nonce, request.fee)
            .await?;

        let txid = tx.txid()?;
        tracing::info!(txid = %txid, nonce = nonce, fee = request.fee, "Broadcasting transaction");
        self.broadcast(&tx).await
    }
}

impl std::fmt::Debug for StacksClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StacksClient")
            .field("node_url", &self.config.node_url)
            .field("network", &self.config.network)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
