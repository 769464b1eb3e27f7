//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a transfer run.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::stacks::types::StacksNetwork;

/// Root configuration for a token transfer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransferConfig {
    /// Node connection settings.
    pub network: NetworkConfig,

    /// Token contract being transferred.
    pub token: TokenConfig,

    /// Settlement verification loop settings.
    pub verification: VerificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Stacks node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Which Stacks network to sign for.
    pub network: StacksNetwork,

    /// Stacks node (or API gateway) base URL.
    pub node_url: String,

    /// Failover node URLs, tried in order after `node_url`.
    pub failover_urls: Vec<String>,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Block explorer base URL used for the transaction link.
    pub explorer_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: StacksNetwork::Testnet,
            node_url: "https://api.testnet.hiro.so".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            explorer_url: "https://explorer.stacks.co".to_string(),
        }
    }
}

/// SIP-010 token contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Deployer address of the token contract.
    pub contract_address: String,

    /// Contract name.
    pub contract_name: String,

    /// Public function moving tokens: `(amount sender recipient memo)`.
    pub transfer_function: String,

    /// Read-only balance lookup: `(owner) -> (response uint uint)`.
    pub balance_function: String,

    /// Flat transaction fee in micro-STX.
    pub fee: u64,

    /// Check the call against the deployed contract interface before signing.
    pub validate_with_abi: bool,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            contract_address: "ST1X8ZTAN1JBX148PNJY4D1BPZ1QKCKV3H3CK5ACA".to_string(),
            contract_name: "Krypto".to_string(),
            transfer_function: "transfer".to_string(),
            balance_function: "get-balance".to_string(),
            fee: 2000,
            validate_with_abi: true,
        }
    }
}

/// Settlement verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Number of balance comparisons before giving up.
    pub max_attempts: u32,

    /// Wait after broadcast before the first comparison, in seconds.
    pub settle_delay_secs: u64,

    /// Fixed wait between comparisons, in seconds.
    pub retry_delay_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            settle_delay_secs: 15,
            retry_delay_secs: 20,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the pretty format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
