//! Settlement verification.
//!
//! After broadcast, re-read both balances a bounded number of times with a
//! fixed pause between reads, until the sender has lost exactly `amount` and
//! the recipient has gained exactly `amount`.
//!
//! # Design Decisions
//! - Exact equality: over-crediting counts as not settled, same as pending
//! - Fixed delay, not backoff: block cadence is roughly constant
//! - Exhaustion is not an error; the broadcast already succeeded

use std::time::Duration;

use tokio::time::sleep;

use crate::config::VerificationConfig;
use crate::stacks::address::StacksAddress;
use crate::stacks::chain::ChainClient;
use crate::transfer::balance::get_token_balance;
use crate::transfer::token::TokenContract;

/// What a settled transfer looks like, relative to the pre-transfer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementExpectation {
    pub sender: StacksAddress,
    pub recipient: StacksAddress,
    pub amount: u128,
    pub sender_before: u128,
    pub recipient_before: u128,
}

/// Result of one verification attempt, or of the whole loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Both deltas matched on this attempt (1-based).
    Verified { attempt: u32 },
    /// Not settled yet; another attempt follows.
    Pending,
    /// Gave up after this many attempts; the transaction may still confirm.
    Inconclusive { attempts: u32 },
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationOutcome::Verified { .. })
    }
}

/// Whether post-transfer balances show exactly `amount` moved.
///
/// A balance moving the wrong way never matches.
pub fn settlement_matches(
    expectation: &SettlementExpectation,
    sender_after: u128,
    recipient_after: u128,
) -> bool {
    let sender_delta = expectation.sender_before.checked_sub(sender_after);
    let recipient_delta = recipient_after.checked_sub(expectation.recipient_before);
    sender_delta == Some(expectation.amount) && recipient_delta == Some(expectation.amount)
}

/// Re-read both balances once and compare against the expectation.
pub async fn verify_transfer<C>(
    client: &C,
    token: &TokenContract,
    expectation: &SettlementExpectation,
) -> bool
where
    C: ChainClient + ?Sized,
{
    let sender_after = get_token_balance(client, token, &expectation.sender).await;
    let recipient_after = get_token_balance(client, token, &expectation.recipient).await;

    println!("\nTransfer verification:");
    println!("Sender's final balance: {}", sender_after);
    println!("Recipient's final balance: {}", recipient_after);
    println!("Amount transferred: {}", expectation.amount);

    settlement_matches(expectation, sender_after, recipient_after)
}

/// Run the bounded verification loop.
///
/// Returns `Verified` as soon as an attempt matches, otherwise
/// `Inconclusive` after `settings.max_attempts` attempts.
pub async fn verify_settlement<C>(
    client: &C,
    token: &TokenContract,
    settings: &VerificationConfig,
    expectation: &SettlementExpectation,
) -> VerificationOutcome
where
    C: ChainClient + ?Sized,
{
    let max_attempts = settings.max_attempts.max(1);
    let retry_delay = Duration::from_secs(settings.retry_delay_secs);

    let mut attempt = 1;
    let outcome = loop {
        println!("\nVerification attempt {} of {}...", attempt, max_attempts);

        let outcome = if verify_transfer(client, token, expectation).await {
            VerificationOutcome::Verified { attempt }
        } else if attempt == max_attempts {
            VerificationOutcome::Inconclusive {
                attempts: max_attempts,
            }
        } else {
            VerificationOutcome::Pending
        };
        if outcome != VerificationOutcome::Pending {
            break outcome;
        }

        tracing::debug!(attempt = attempt, "Balances not settled yet");
        println!(
            "\nVerification not successful. Waiting {} seconds before next attempt...",
            settings.retry_delay_secs
        );
        sleep(retry_delay).await;
        attempt += 1;
    };

    match outcome {
        VerificationOutcome::Verified { attempt } => {
            tracing::info!(attempt = attempt, "Transfer verified");
            println!("\nTransfer verified successfully!");
        }
        _ => {
            tracing::warn!(attempts = max_attempts, "Verification attempts exhausted");
            println!("\nMax verification attempts reached. The transaction may still be processing.");
            println!("Please check the explorer for the latest status.");
        }
    }
    outcome
}
