//! Transaction building, signing, and serialization.
//!
//! # Responsibilities
//! - Assemble single-sig contract-call transactions
//! - Compute the sighash chain and sign with the wallet
//! - Serialize to the consensus wire format for broadcast
//!
//! # Wire layout
//! ```text
//! version(1) chain_id(4) auth anchor_mode(1) post_condition_mode(1)
//!     post_conditions(u32 len ‖ items) payload
//! auth = auth_type(1) hash_mode(1) signer(20) nonce(8) fee(8)
//!     key_encoding(1) signature(65)
//! ```

use alloy::primitives::{hex, B256};
use sha2::{Digest, Sha512_256};

use crate::stacks::address::StacksAddress;
use crate::stacks::clarity::{write_name, ClarityError, ClarityValue};
use crate::stacks::types::{ChainResult, StacksNetwork, TxId};
use crate::stacks::wallet::Wallet;

const AUTH_STANDARD: u8 = 0x04;
const HASH_MODE_P2PKH: u8 = 0x00;
const KEY_ENCODING_COMPRESSED: u8 = 0x00;
const PAYLOAD_CONTRACT_CALL: u8 = 0x02;

/// Which block types may include the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnchorMode {
    OnChainOnly = 0x01,
    OffChainOnly = 0x02,
    Any = 0x03,
}

/// Whether asset movements not covered by post-conditions are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PostConditionMode {
    Allow = 0x01,
    Deny = 0x02,
}

/// Contract-call payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub contract_address: StacksAddress,
    pub contract_name: String,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
}

impl ContractCall {
    fn serialize_into(&self, out: &mut Vec<u8>) -> Result<(), ClarityError> {
        out.push(PAYLOAD_CONTRACT_CALL);
        out.push(self.contract_address.version());
        out.extend_from_slice(self.contract_address.hash160());
        write_name(out, &self.contract_name)?;
        write_name(out, &self.function_name)?;
        out.extend_from_slice(&(self.function_args.len() as u32).to_be_bytes());
        for arg in &self.function_args {
            arg.serialize_into(out)?;
        }
        Ok(())
    }
}

/// Single-signature spending condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingCondition {
    pub signer: [u8; 20],
    pub nonce: u64,
    pub fee: u64,
    pub signature: [u8; 65],
}

impl SpendingCondition {
    /// The condition as it is hashed before signing: nonce, fee and signature zeroed.
    fn cleared(&self) -> Self {
        Self {
            signer: self.signer,
            nonce: 0,
            fee: 0,
            signature: [0u8; 65],
        }
    }

    fn serialize_into(&self, out: &mut Vec<u8>) {
        out.push(HASH_MODE_P2PKH);
        out.extend_from_slice(&self.signer);
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.push(KEY_ENCODING_COMPRESSED);
        out.extend_from_slice(&self.signature);
    }
}

/// A contract-call transaction with standard single-sig authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StacksTransaction {
    pub network: StacksNetwork,
    pub auth: SpendingCondition,
    pub anchor_mode: AnchorMode,
    pub post_condition_mode: PostConditionMode,
    pub payload: ContractCall,
}

impl StacksTransaction {
    /// Serialize into consensus bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, ClarityError> {
        self.serialize_with_auth(&self.auth)
    }

    fn serialize_with_auth(&self, auth: &SpendingCondition) -> Result<Vec<u8>, ClarityError> {
        let mut out = Vec::with_capacity(256);
        out.push(self.network.transaction_version());
        out.extend_from_slice(&self.network.chain_id().to_be_bytes());
        out.push(AUTH_STANDARD);
        auth.serialize_into(&mut out);
        out.push(self.anchor_mode as u8);
        out.push(self.post_condition_mode as u8);
        // No post-conditions.
        out.extend_from_slice(&0u32.to_be_bytes());
        self.payload.serialize_into(&mut out)?;
        Ok(out)
    }

    /// Transaction ID: SHA-512/256 of the serialized transaction.
    pub fn txid(&self) -> Result<TxId, ClarityError> {
        Ok(TxId(hex::encode(sha512_256(&self.serialize()?))))
    }

    /// Sighash the signer commits to: the initial (cleared-auth) sighash
    /// extended with auth type, fee and nonce.
    pub fn presign_sighash(&self) -> Result<B256, ClarityError> {
        let initial = sha512_256(&self.serialize_with_auth(&self.auth.cleared())?);

        let mut hasher = Sha512_256::new();
        hasher.update(initial);
        hasher.update([AUTH_STANDARD]);
        hasher.update(self.auth.fee.to_be_bytes());
        hasher.update(self.auth.nonce.to_be_bytes());
        Ok(B256::from_slice(&hasher.finalize()))
    }
}

/// SHA-512/256 digest.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    Sha512_256::digest(data).into()
}

/// Transaction builder for contract calls.
pub struct TxBuilder<'a> {
    wallet: &'a Wallet,
}

impl<'a> TxBuilder<'a> {
    /// Create a new transaction builder.
    pub fn new(wallet: &'a Wallet) -> Self {
        Self { wallet }
    }

    /// Build and sign a contract call.
    ///
    /// # Arguments
    /// * `call` - Contract, function and arguments
    /// * `nonce` - Sender's next account nonce
    /// * `fee` - Flat fee in micro-STX
    pub async fn build_contract_call(
        &self,
        call: ContractCall,
        nonce: u64,
        fee: u64,
    ) -> ChainResult<StacksTransaction> {
        let mut tx = StacksTransaction {
            network: self.wallet.network(),
            auth: SpendingCondition {
                signer: *self.wallet.address().hash160(),
                nonce,
                fee,
                signature: [0u8; 65],
            },
            anchor_mode: AnchorMode::Any,
            post_condition_mode: PostConditionMode::Allow,
            payload: call,
        };

        let sighash = tx.presign_sighash()?;
        tx.auth.signature = self.wallet.sign_sighash(sighash).await?;

        let txid = tx.txid()?;
        tracing::debug!(
            txid = %txid,
            nonce = nonce,
            fee = fee,
            "Contract call signed"
        );

        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Signature, U256};

    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const CONTRACT: &str = "ST1X8ZTAN1JBX148PNJY4D1BPZ1QKCKV3H3CK5ACA";

    fn transfer_call(wallet: &Wallet) -> ContractCall {
        let recipient: StacksAddress = "ST000000000000000000002AMW42H".parse().unwrap();
        ContractCall {
            contract_address: CONTRACT.parse().unwrap(),
            contract_name: "Krypto".to_string(),
            function_name: "transfer".to_string(),
            function_args: vec![
                ClarityValue::UInt(100),
                ClarityValue::principal(wallet.address()),
                ClarityValue::principal(recipient),
                ClarityValue::OptionalNone,
            ],
        }
    }

    #[test]
    fn test_sha512_256_empty() {
        assert_eq!(
            hex::encode(sha512_256(b"")),
            "c672b8d1ef56ed28ab87c3622c5114069bdd3ad7b8f9737498d0c01ecef0967a"
        );
    }

    #[tokio::test]
    async fn test_serialized_layout() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let tx = TxBuilder::new(&wallet)
            .build_contract_call(transfer_call(&wallet), 7, 2000)
            .await
            .unwrap();
        let bytes = tx.serialize().unwrap();

        assert_eq!(bytes[0], 0x80);
        assert_eq!(&bytes[1..5], &[0x80, 0, 0, 0]);
        assert_eq!(bytes[5], AUTH_STANDARD);
        assert_eq!(bytes[6], HASH_MODE_P2PKH);
        assert_eq!(&bytes[7..27], wallet.address().hash160());
        assert_eq!(&bytes[27..35], &7u64.to_be_bytes());
        assert_eq!(&bytes[35..43], &2000u64.to_be_bytes());
        assert_eq!(bytes[43], KEY_ENCODING_COMPRESSED);
        // signature occupies 44..109
        assert_eq!(bytes[109], AnchorMode::Any as u8);
        assert_eq!(bytes[110], PostConditionMode::Allow as u8);
        assert_eq!(&bytes[111..115], &[0, 0, 0, 0]);
        assert_eq!(bytes[115], PAYLOAD_CONTRACT_CALL);
        assert_eq!(bytes[116], 26);
        assert_eq!(bytes[137], 6);
        assert_eq!(&bytes[138..144], b"Krypto");
        assert_eq!(bytes[144], 8);
        assert_eq!(&bytes[145..153], b"transfer");
        assert_eq!(&bytes[153..157], &4u32.to_be_bytes());
        assert_eq!(*bytes.last().unwrap(), 0x09);
    }

    #[tokio::test]
    async fn test_signature_commits_to_presign_sighash() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let tx = TxBuilder::new(&wallet)
            .build_contract_call(transfer_call(&wallet), 0, 2000)
            .await
            .unwrap();

        let vrs = tx.auth.signature;
        let signature = Signature::new(
            U256::from_be_slice(&vrs[1..33]),
            U256::from_be_slice(&vrs[33..]),
            vrs[0] == 1,
        );
        let recovered = signature.recover_from_prehash(&tx.presign_sighash().unwrap()).unwrap();
        let recovered_address =
            StacksAddress::from_public_key(StacksNetwork::Testnet, recovered.to_encoded_point(true).as_bytes());
        assert_eq!(recovered_address, wallet.address());
    }

    #[tokio::test]
    async fn test_sighash_depends_on_fee_and_nonce() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let builder = TxBuilder::new(&wallet);
        let a = builder.build_contract_call(transfer_call(&wallet), 0, 2000).await.unwrap();
        let b = builder.build_contract_call(transfer_call(&wallet), 1, 2000).await.unwrap();
        let c = builder.build_contract_call(transfer_call(&wallet), 0, 3000).await.unwrap();

        assert_ne!(a.presign_sighash().unwrap(), b.presign_sighash().unwrap());
        assert_ne!(a.presign_sighash().unwrap(), c.presign_sighash().unwrap());
        assert_ne!(a.txid().unwrap(), b.txid().unwrap());
        assert_eq!(a.txid().unwrap().0.len(), 64);
    }

    #[tokio::test]
    async fn test_rejects_invalid_function_name() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let mut call = transfer_call(&wallet);
        call.function_name = String::new();
        assert!(TxBuilder::new(&wallet).build_contract_call(call, 0, 2000).await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_overlong_contract_principal_argument() {
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, StacksNetwork::Testnet).unwrap();
        let mut call = transfer_call(&wallet);
        call.function_args[2] = ClarityValue::ContractPrincipal(wallet.address(), "v".repeat(256));

        let err = TxBuilder::new(&wallet)
            .build_contract_call(call, 0, 2000)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid name"));
    }
}
