//! Stacks token transfer CLI.
//!
//! Transfers a SIP-010 token through the contract's `transfer` function and
//! polls `get-balance` until the move shows up on chain.
//!
//! # Architecture Overview
//!
//! ```text
//!   stdin prompts ──▶ transfer::input ──▶ transfer::orchestrator ──▶ stacks::client ──▶ Stacks node
//!                                                  │                       ▲
//!                                                  ▼                       │
//!                                        transfer::verifier ──────────────┘
//!                                                  │       (balance re-reads)
//!                                                  ▼
//!                                            stdout report
//! ```
//!
//! # Usage
//!
//! ```text
//! STX_TRANSFER_PRIVATE_KEY=<hex> stx-transfer [--config transfer.toml]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use stx_transfer::config::load_or_default;
use stx_transfer::observability::logging;
use stx_transfer::stacks::{StacksClient, Wallet};
use stx_transfer::transfer::{self, Prompter};

#[derive(Parser)]
#[command(name = "stx-transfer")]
#[command(about = "Transfer SIP-010 tokens on Stacks and verify settlement", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in testnet defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);

    tracing::info!(
        network = %config.network.network,
        node_url = %config.network.node_url,
        contract = %format!("{}.{}", config.token.contract_address, config.token.contract_name),
        "Configuration loaded"
    );

    println!(
        "=== Stacks Token Transfer Script ({}) ===\n",
        config.network.network
    );

    let client = match Wallet::from_env(config.network.network)
        .and_then(|wallet| StacksClient::new(config.network.clone(), wallet))
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("\nError: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut prompter = Prompter::stdio();
    match transfer::run(&client, &config, &mut prompter).await {
        Ok(receipt) => tracing::info!(
            txid = %receipt.txid,
            verified = receipt.outcome.is_verified(),
            "Transfer finished"
        ),
        // A failed run still ends normally once the error is reported.
        Err(e) => eprintln!("\nError: {}", e),
    }

    ExitCode::SUCCESS
}
