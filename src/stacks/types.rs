//! Chain-specific types and error definitions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stacks::address::AddressError;
use crate::stacks::clarity::ClarityError;

/// Stacks network selector.
///
/// Determines address versions, the transaction version byte and the chain ID
/// mixed into every signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StacksNetwork {
    #[default]
    Testnet,
    Mainnet,
}

impl StacksNetwork {
    /// Transaction version byte.
    pub fn transaction_version(self) -> u8 {
        match self {
            StacksNetwork::Testnet => 0x80,
            StacksNetwork::Mainnet => 0x00,
        }
    }

    /// Chain ID, as reported by `/v2/info` under `network_id`.
    pub fn chain_id(self) -> u32 {
        match self {
            StacksNetwork::Testnet => 0x8000_0000,
            StacksNetwork::Mainnet => 0x0000_0001,
        }
    }

    /// Address version for single-signature (P2PKH) accounts.
    pub fn single_sig_version(self) -> u8 {
        match self {
            StacksNetwork::Testnet => 26,
            StacksNetwork::Mainnet => 22,
        }
    }

    /// Address version for multi-signature (P2SH) accounts.
    pub fn multi_sig_version(self) -> u8 {
        match self {
            StacksNetwork::Testnet => 21,
            StacksNetwork::Mainnet => 20,
        }
    }

    /// Prefix every single-sig address on this network starts with.
    pub fn address_prefix(self) -> &'static str {
        match self {
            StacksNetwork::Testnet => "ST",
            StacksNetwork::Mainnet => "SP",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StacksNetwork::Testnet => "testnet",
            StacksNetwork::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for StacksNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Transaction identifier returned by the node after broadcast.
///
/// Opaque: displayed and linked, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    /// HTTP connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered, but with something unexpected.
    #[error("Unexpected node response: {0}")]
    UnexpectedResponse(String),

    /// A read-only call was evaluated and failed.
    #[error("Read-only call failed: {0}")]
    ReadOnlyFailed(String),

    /// Invalid private key format or signing failure.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Contract call does not match the deployed contract interface.
    #[error("ABI validation failed: {0}")]
    Abi(String),

    /// Network reported by the node differs from configuration.
    #[error("Chain ID mismatch: expected {expected:#x}, got {actual:#x}")]
    ChainMismatch { expected: u32, actual: u32 },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Clarity(#[from] ClarityError),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Outcome of handing a signed transaction to the node.
///
/// A rejected transaction is not a transport failure: the node answered and
/// `error` carries its verdict verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastResponse {
    pub txid: TxId,
    pub error: Option<String>,
    pub reason: Option<String>,
}

impl BroadcastResponse {
    pub fn accepted(txid: impl Into<String>) -> Self {
        Self {
            txid: TxId(txid.into()),
            error: None,
            reason: None,
        }
    }

    pub fn rejected(txid: impl Into<String>, error: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            txid: TxId(txid.into()),
            error: Some(error.into()),
            reason,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.error.is_none()
    }
}
