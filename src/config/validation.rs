//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the token contract address against the configured network
//! - Validate value ranges (attempts > 0, timeouts > 0, URLs parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransferConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::TransferConfig;
use crate::stacks::address::StacksAddress;
use crate::stacks::clarity::MAX_NAME_LEN;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("network.node_url '{url}' is not a valid URL: {reason}")]
    InvalidNodeUrl { url: String, reason: String },

    #[error("network.failover_urls entry '{0}' is not a valid URL")]
    InvalidFailoverUrl(String),

    #[error("network.rpc_timeout_secs must be greater than zero")]
    ZeroRpcTimeout,

    #[error("token.contract_address '{address}' is invalid: {reason}")]
    InvalidContractAddress { address: String, reason: String },

    #[error("token.{field} must not be empty")]
    EmptyName { field: &'static str },

    #[error("token.{field} exceeds {max} bytes", max = MAX_NAME_LEN)]
    NameTooLong { field: &'static str },

    #[error("verification.max_attempts must be at least 1")]
    ZeroAttempts,
}

/// Validate a deserialized configuration, collecting every error.
pub fn validate_config(config: &TransferConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.network.node_url) {
        errors.push(ValidationError::InvalidNodeUrl {
            url: config.network.node_url.clone(),
            reason: e.to_string(),
        });
    }
    for failover in &config.network.failover_urls {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::InvalidFailoverUrl(failover.clone()));
        }
    }
    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRpcTimeout);
    }

    match config.token.contract_address.parse::<StacksAddress>() {
        Ok(address) if !address.belongs_to(config.network.network) => {
            errors.push(ValidationError::InvalidContractAddress {
                address: config.token.contract_address.clone(),
                reason: format!("not a {} address", config.network.network),
            });
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidContractAddress {
            address: config.token.contract_address.clone(),
            reason: e.to_string(),
        }),
    }

    let names = [
        ("contract_name", &config.token.contract_name),
        ("transfer_function", &config.token.transfer_function),
        ("balance_function", &config.token.balance_function),
    ];
    for (field, value) in names {
        if value.is_empty() {
            errors.push(ValidationError::EmptyName { field });
        } else if value.len() > MAX_NAME_LEN {
            errors.push(ValidationError::NameTooLong { field });
        }
    }

    if config.verification.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
