//! Resolved token contract settings.

use crate::config::TokenConfig;
use crate::stacks::address::StacksAddress;
use crate::stacks::types::ChainResult;

/// The SIP-010 contract a run transfers, with its address already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContract {
    pub address: StacksAddress,
    pub name: String,
    pub transfer_function: String,
    pub balance_function: String,
    pub fee: u64,
    pub validate_with_abi: bool,
}

impl TokenContract {
    pub fn from_config(config: &TokenConfig) -> ChainResult<Self> {
        Ok(Self {
            address: config.contract_address.parse()?,
            name: config.contract_name.clone(),
            transfer_function: config.transfer_function.clone(),
            balance_function: config.balance_function.clone(),
            fee: config.fee,
            validate_with_abi: config.validate_with_abi,
        })
    }
}
