//! The chain capabilities a transfer depends on.
//!
//! The orchestrator and verifier only talk to this trait, so they run the
//! same against a live node and against an in-memory chain in tests.

use async_trait::async_trait;

use crate::stacks::address::StacksAddress;
use crate::stacks::clarity::ClarityValue;
use crate::stacks::types::{BroadcastResponse, ChainResult};

/// Everything needed to build, sign and broadcast a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallRequest {
    pub contract_address: StacksAddress,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
    /// Flat fee in micro-STX.
    pub fee: u64,
    /// Check the call against the deployed contract interface first.
    pub validate_with_abi: bool,
}

/// Read and write access to a Stacks chain on behalf of one sender.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address derived from the sender's private key.
    fn sender_address(&self) -> StacksAddress;

    /// Connectivity check run once input has been validated. Failures are
    /// reported as warnings, not fatal.
    async fn preflight(&self) -> ChainResult<()> {
        Ok(())
    }

    /// Evaluate a read-only contract function without a transaction.
    ///
    /// # Errors
    /// Transport failures, timeouts, and calls the node evaluated to a
    /// runtime error.
    async fn call_read_only(
        &self,
        contract_address: &StacksAddress,
        contract_name: &str,
        function_name: &str,
        args: &[ClarityValue],
        sender: &StacksAddress,
    ) -> ChainResult<ClarityValue>;

    /// Build, sign and broadcast a contract call.
    ///
    /// A node rejection is returned as `Ok` with `error` set; `Err` means the
    /// transaction could not be built or the node could not be reached.
    async fn submit_contract_call(
        &self,
        request: ContractCallRequest,
    ) -> ChainResult<BroadcastResponse>;
}
