//! Stacks chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)
//!     → wallet.rs (key loading, address derivation, signing)
//!     → transaction.rs (build, sighash, sign, serialize)
//!     → client.rs (node HTTP API with timeouts and failover)
//!     → chain.rs (ChainClient trait consumed by the transfer flow)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All node calls have configurable timeouts

pub mod address;
pub mod chain;
pub mod clarity;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::StacksAddress;
pub use chain::{ChainClient, ContractCallRequest};
pub use clarity::ClarityValue;
pub use client::StacksClient;
pub use types::{BroadcastResponse, ChainError, ChainResult, StacksNetwork, TxId};
pub use wallet::Wallet;
