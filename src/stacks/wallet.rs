//! Wallet management and transaction signing.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized
//! - The `Debug` impl shows the derived address, never the key

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::stacks::address::StacksAddress;
use crate::stacks::types::{ChainError, ChainResult, StacksNetwork};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "STX_TRANSFER_PRIVATE_KEY";

/// Suffix Stacks tooling appends to keys whose public key is compressed.
const COMPRESSED_SUFFIX: &str = "01";

/// Wallet holding the sender's signing key.
#[derive(Clone)]
pub struct Wallet {
    /// The underlying secp256k1 signer.
    signer: PrivateKeySigner,
    /// Compressed SEC1 public key.
    public_key: [u8; 33],
    /// Address derived from `public_key` for `network`.
    address: StacksAddress,
    network: StacksNetwork,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - 32-byte hex key, optionally `0x`-prefixed and
    ///   optionally followed by the `01` compression flag
    /// * `network` - Network the derived address and signatures belong to
    ///
    /// # Security
    /// The private key is parsed and stored securely. It is never logged.
    pub fn from_private_key(private_key_hex: &str, network: StacksNetwork) -> ChainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let key_hex = match key_hex.len() {
            64 => key_hex,
            66 => key_hex.strip_suffix(COMPRESSED_SUFFIX).ok_or_else(|| {
                ChainError::Wallet("Invalid private key format: unknown key suffix".to_string())
            })?,
            n => {
                return Err(ChainError::Wallet(format!(
                    "Invalid private key format: expected 64 or 66 hex characters, got {}",
                    n
                )))
            }
        };

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        let encoded = signer.credential().verifying_key().to_encoded_point(true);
        let public_key: [u8; 33] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| ChainError::Wallet("Unexpected public key length".to_string()))?;
        let address = StacksAddress::from_public_key(network, &public_key);

        tracing::info!(address = %address, network = %network, "Wallet initialized");

        Ok(Self {
            signer,
            public_key,
            address,
            network,
        })
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `STX_TRANSFER_PRIVATE_KEY` from environment.
    pub fn from_env(network: StacksNetwork) -> ChainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            ChainError::Wallet(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key, network)
    }

    /// The sender address derived from the key.
    pub fn address(&self) -> StacksAddress {
        self.address
    }

    pub fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub fn network(&self) -> StacksNetwork {
        self.network
    }

    /// Sign a presign sighash.
    ///
    /// # Returns
    /// The 65-byte recoverable signature in Stacks order: recovery id, r, s.
    pub async fn sign_sighash(&self, sighash: B256) -> ChainResult<[u8; 65]> {
        let signature = self
            .signer
            .sign_hash(&sighash)
            .await
            .map_err(|e| ChainError::Wallet(format!("Signing failed: {}", e)))?;

        let mut vrs = [0u8; 65];
        vrs[0] = signature.v() as u8;
        vrs[1..33].copy_from_slice(&signature.r().to_be_bytes::<32>());
        vrs[33..].copy_from_slice(&signature.s().to_be_bytes::<32>());
        Ok(vrs)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address.to_string())
            .field("network", &self.network)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{hex, Signature, U256};

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "ST2JN8XG1BG9TZE5FQ4GP0CMTHKF9EVRZ5THN11R1";

    #[test]
    fn test_wallet_from_private_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
        assert_eq!(
            hex::encode(wallet.public_key()),
            "038318535b54105d4a7aae60c08fc45f9687181b4fdfc625bd1a753fa7397fed75"
        );
    }

    #[test]
    fn test_wallet_with_prefix_and_compression_suffix() {
        let wallet =
            Wallet::from_private_key(&format!("0x{}01", TEST_PRIVATE_KEY), StacksNetwork::Testnet)
                .unwrap();
        assert_eq!(wallet.address().to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_mainnet_address_uses_mainnet_version() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Mainnet).unwrap();
        assert!(wallet.address().to_string().starts_with("SP"));
        assert_eq!(
            hex::encode(wallet.address().hash160()),
            "a55476015c13afb8afb92160329a8cde976f1f2e"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = Wallet::from_private_key("invalid_key", StacksNetwork::Testnet);
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));

        let result = Wallet::from_private_key(&format!("{}02", TEST_PRIVATE_KEY), StacksNetwork::Testnet);
        assert!(result.unwrap_err().to_string().contains("unknown key suffix"));
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(TEST_ADDRESS));
        assert!(!debug.contains(TEST_PRIVATE_KEY));
    }

    #[tokio::test]
    async fn test_signature_recovers_wallet_key() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let sighash = B256::repeat_byte(0x42);
        let vrs = wallet.sign_sighash(sighash).await.unwrap();
        assert!(vrs[0] <= 1);

        let signature = Signature::new(
            U256::from_be_slice(&vrs[1..33]),
            U256::from_be_slice(&vrs[33..]),
            vrs[0] == 1,
        );
        let recovered = signature.recover_from_prehash(&sighash).unwrap();
        assert_eq!(
            recovered.to_encoded_point(true).as_bytes(),
            wallet.public_key().as_slice()
        );
    }
}
