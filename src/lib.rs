//! Stacks SIP-010 token transfer with settlement verification.

pub mod config;
pub mod observability;
pub mod stacks;
pub mod transfer;

pub use config::schema::TransferConfig;
pub use stacks::{ChainClient, StacksClient};
pub use transfer::{run, transfer_tokens, TransferReceipt};
