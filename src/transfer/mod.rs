//! Token transfer subsystem.
//!
//! # Data Flow
//! ```text
//! prompts
//!     → input.rs (address + amount validation)
//!     → orchestrator.rs (snapshot, funds check, build + broadcast)
//!     → verifier.rs (bounded re-reads until balances settle)
//!     → balance.rs (fail-open read-only balance calls)
//!     → console report
//! ```
//!
//! # Design Decisions
//! - Input errors abort before any chain call
//! - Only settlement verification retries; nothing else does
//! - Balance reads degrade to zero instead of failing

pub mod balance;
pub mod input;
pub mod orchestrator;
pub mod token;
pub mod verifier;

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::config::TransferConfig;
use crate::stacks::chain::ChainClient;

pub use balance::{get_token_balance, query_token_balance};
pub use input::{collect_input, parse_amount, validate_amount, validate_recipient_address, InputError, Prompter};
pub use orchestrator::{transfer_tokens, TransferError, TransferReceipt};
pub use token::TokenContract;
pub use verifier::{settlement_matches, verify_settlement, SettlementExpectation, VerificationOutcome};

/// Prompt for a recipient and amount, then transfer and verify.
pub async fn run<C, R, W>(
    client: &C,
    config: &TransferConfig,
    prompter: &mut Prompter<R, W>,
) -> Result<TransferReceipt, TransferError>
where
    C: ChainClient + ?Sized,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (recipient, amount) = collect_input(prompter, config.network.network).await?;

    if let Err(e) = client.preflight().await {
        tracing::warn!(error = %e, "Node preflight check failed, continuing");
    }

    transfer_tokens(client, config, recipient, amount).await
}
