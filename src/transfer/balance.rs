//! Token balance lookups.
//!
//! `get_token_balance` never fails: any error is logged and reported as a
//! zero balance. The settlement verifier relies on this, since a degraded
//! read shows up as a delta mismatch and costs a retry instead of the run.

use crate::stacks::address::StacksAddress;
use crate::stacks::chain::ChainClient;
use crate::stacks::clarity::ClarityValue;
use crate::stacks::types::ChainResult;
use crate::transfer::token::TokenContract;

/// Query the token balance of `address`, surfacing every failure.
pub async fn query_token_balance<C>(
    client: &C,
    token: &TokenContract,
    address: &StacksAddress,
) -> ChainResult<u128>
where
    C: ChainClient + ?Sized,
{
    let value = client
        .call_read_only(
            &token.address,
            &token.name,
            &token.balance_function,
            &[ClarityValue::principal(*address)],
            address,
        )
        .await?;
    Ok(value.expect_ok_uint()?)
}

/// Query the token balance of `address`, degrading to zero on any error.
pub async fn get_token_balance<C>(client: &C, token: &TokenContract, address: &StacksAddress) -> u128
where
    C: ChainClient + ?Sized,
{
    tracing::debug!(address = %address, "Fetching balance");
    match query_token_balance(client, token, address).await {
        Ok(balance) => {
            tracing::debug!(address = %address, balance = %balance, "Balance fetched");
            balance
        }
        Err(e) => {
            tracing::error!(address = %address, error = %e, "Error getting balance, defaulting to 0");
            0
        }
    }
}
