//! Transfer orchestration.
//!
//! # Sequence
//! ```text
//! derive sender → snapshot balances → funds check → build + broadcast
//!     → report txid → settle delay → verify_settlement
//! ```
//! Every failure before broadcast, and the broadcast itself, ends the run.
//! Nothing local needs rolling back: the chain is the only state.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::config::{NetworkConfig, TransferConfig};
use crate::stacks::address::StacksAddress;
use crate::stacks::chain::{ChainClient, ContractCallRequest};
use crate::stacks::clarity::ClarityValue;
use crate::stacks::types::{ChainError, TxId};
use crate::transfer::balance::get_token_balance;
use crate::transfer::input::InputError;
use crate::transfer::token::TokenContract;
use crate::transfer::verifier::{verify_settlement, SettlementExpectation, VerificationOutcome};

/// Errors that end a transfer run.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Insufficient balance for transfer: balance {balance}, requested {requested}")]
    InsufficientBalance { balance: u128, requested: u128 },

    /// The node rejected the transaction; the message is the node's own.
    #[error("{0}")]
    Broadcast(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// What a completed run reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub txid: TxId,
    pub sender: StacksAddress,
    pub outcome: VerificationOutcome,
}

/// Explorer link for a transaction.
pub fn explorer_url(network: &NetworkConfig, txid: &TxId) -> String {
    format!(
        "{}/txid/{}?chain={}",
        network.explorer_url.trim_end_matches('/'),
        txid,
        network.network.name()
    )
}

/// Arguments of a SIP-010 `transfer`: amount, sender, recipient, no memo.
pub fn transfer_args(amount: u128, sender: StacksAddress, recipient: StacksAddress) -> Vec<ClarityValue> {
    vec![
        ClarityValue::UInt(amount),
        ClarityValue::principal(sender),
        ClarityValue::principal(recipient),
        ClarityValue::OptionalNone,
    ]
}

/// Transfer `amount` tokens to `recipient` and verify settlement.
///
/// # Errors
/// - `InsufficientBalance` when the sender's snapshot is below `amount`
/// - `Broadcast` when the node rejects the transaction
/// - `Chain` when the transaction cannot be built or submitted
pub async fn transfer_tokens<C>(
    client: &C,
    config: &TransferConfig,
    recipient: StacksAddress,
    amount: u128,
) -> Result<TransferReceipt, TransferError>
where
    C: ChainClient + ?Sized,
{
    let token = TokenContract::from_config(&config.token)?;

    let sender = client.sender_address();
    println!("\nSender's address: {}", sender);

    println!("\nFetching initial balances...");
    let sender_before = get_token_balance(client, &token, &sender).await;
    let recipient_before = get_token_balance(client, &token, &recipient).await;
    println!("Sender's initial balance: {}", sender_before);
    println!("Recipient's initial balance: {}", recipient_before);

    if sender_before < amount {
        return Err(TransferError::InsufficientBalance {
            balance: sender_before,
            requested: amount,
        });
    }

    let request = ContractCallRequest {
        contract_address: token.address,
        contract_name: token.name.clone(),
        function_name: token.transfer_function.clone(),
        function_args: transfer_args(amount, sender, recipient),
        fee: token.fee,
        validate_with_abi: token.validate_with_abi,
    };

    println!("\nCreating and broadcasting transaction...");
    let response = client.submit_contract_call(request).await?;
    if let Some(error) = response.error {
        tracing::error!(
            txid = %response.txid,
            reason = response.reason.as_deref().unwrap_or(""),
            "Broadcast rejected"
        );
        return Err(TransferError::Broadcast(error));
    }
    let txid = response.txid;

    println!("\nTransaction successful!");
    println!("Transaction ID: {}", txid);
    println!("View in Explorer: {}", explorer_url(&config.network, &txid));

    println!("\nWaiting for transaction to be processed...");
    sleep(Duration::from_secs(config.verification.settle_delay_secs)).await;

    let expectation = SettlementExpectation {
        sender,
        recipient,
        amount,
        sender_before,
        recipient_before,
    };
    let outcome = verify_settlement(client, &token, &config.verification, &expectation).await;

    Ok(TransferReceipt {
        txid,
        sender,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::types::StacksNetwork;

    #[test]
    fn test_explorer_url() {
        let mut network = NetworkConfig::default();
        let txid = TxId("abc123".to_string());
        assert_eq!(
            explorer_url(&network, &txid),
            "https://explorer.stacks.co/txid/abc123?chain=testnet"
        );

        network.network = StacksNetwork::Mainnet;
        network.explorer_url = "https://example.org/".to_string();
        assert_eq!(
            explorer_url(&network, &txid),
            "https://example.org/txid/abc123?chain=mainnet"
        );
    }

    #[test]
    fn test_transfer_args_shape() {
        let sender: StacksAddress = "ST2JN8XG1BG9TZE5FQ4GP0CMTHKF9EVRZ5THN11R1".parse().unwrap();
        let recipient: StacksAddress = "ST000000000000000000002AMW42H".parse().unwrap();
        let args = transfer_args(100, sender, recipient);

        assert_eq!(args.len(), 4);
        assert_eq!(args[0], ClarityValue::UInt(100));
        assert_eq!(args[1], ClarityValue::StandardPrincipal(sender));
        assert_eq!(args[2], ClarityValue::StandardPrincipal(recipient));
        assert_eq!(args[3], ClarityValue::OptionalNone);
    }

    #[test]
    fn test_broadcast_error_is_verbatim() {
        let err = TransferError::Broadcast("ConflictingNonceInMempool".to_string());
        assert_eq!(err.to_string(), "ConflictingNonceInMempool");
    }
}
