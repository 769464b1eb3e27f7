//! Stacks addresses in c32check encoding.
//!
//! An address is a version byte plus the hash160 of a public key (or script),
//! rendered as `S` + version character + c32(hash ‖ checksum). The checksum is
//! the first four bytes of a double SHA-256 over `version ‖ hash`.

use std::fmt;
use std::str::FromStr;

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::stacks::types::StacksNetwork;

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Errors from parsing a c32check address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address must start with 'S'")]
    MissingPrefix,

    #[error("address is too short")]
    TooShort,

    #[error("invalid c32 character '{0}'")]
    InvalidCharacter(char),

    #[error("address checksum mismatch")]
    BadChecksum,

    #[error("address hash must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// A decoded Stacks address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
    version: u8,
    hash160: [u8; 20],
}

impl StacksAddress {
    /// Build an address from its raw parts. Only the low five bits of
    /// `version` are representable in c32.
    pub fn new(version: u8, hash160: [u8; 20]) -> Self {
        Self {
            version: version & 0x1f,
            hash160,
        }
    }

    /// Single-sig address of a compressed secp256k1 public key.
    pub fn from_public_key(network: StacksNetwork, public_key: &[u8]) -> Self {
        Self::new(network.single_sig_version(), hash160(public_key))
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn hash160(&self) -> &[u8; 20] {
        &self.hash160
    }

    /// Whether this address's version belongs to `network`.
    pub fn belongs_to(&self, network: StacksNetwork) -> bool {
        self.version == network.single_sig_version() || self.version == network.multi_sig_version()
    }
}

impl fmt::Display for StacksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = self.hash160.to_vec();
        payload.extend_from_slice(&checksum(self.version, &self.hash160));
        write!(
            f,
            "S{}{}",
            C32_ALPHABET[self.version as usize] as char,
            c32_encode(&payload)
        )
    }
}

impl FromStr for StacksAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        let normalized = normalize(s);
        let rest = normalized.strip_prefix('S').ok_or(AddressError::MissingPrefix)?;
        if rest.len() < 2 {
            return Err(AddressError::TooShort);
        }

        let version = c32_digit(rest.as_bytes()[0])?;
        let decoded = c32_decode(&rest[1..])?;
        if decoded.len() < 4 {
            return Err(AddressError::TooShort);
        }

        let (data, check) = decoded.split_at(decoded.len() - 4);
        if checksum(version, data) != check {
            return Err(AddressError::BadChecksum);
        }
        let hash160: [u8; 20] = data
            .try_into()
            .map_err(|_| AddressError::InvalidLength(data.len()))?;

        Ok(Self { version, hash160 })
    }
}

/// Whether `address` is a well-formed c32check address of any version.
pub fn is_valid_address_format(address: &str) -> bool {
    address.parse::<StacksAddress>().is_ok()
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

fn checksum(version: u8, data: &[u8]) -> [u8; 4] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let once = hasher.finalize();
    let twice = Sha256::digest(once);
    [twice[0], twice[1], twice[2], twice[3]]
}

/// Uppercase and fold the visually ambiguous letters onto their digits.
fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_ascii_uppercase() {
            'O' => '0',
            'L' | 'I' => '1',
            other => other,
        })
        .collect()
}

fn c32_digit(c: u8) -> Result<u8, AddressError> {
    C32_ALPHABET
        .iter()
        .position(|&a| a == c)
        .map(|i| i as u8)
        .ok_or(AddressError::InvalidCharacter(c as char))
}

/// Encode bytes as c32, preserving leading zero bytes as leading `0`s.
fn c32_encode(input: &[u8]) -> String {
    let mut out = Vec::with_capacity(input.len() * 8 / 5 + 1);
    let mut carry: u8 = 0;
    let mut carry_bits: u8 = 0;

    for &byte in input.iter().rev() {
        let take = 5 - carry_bits;
        let low = byte & ((1u8 << take) - 1);
        out.push(C32_ALPHABET[((low << carry_bits) + carry) as usize]);

        carry_bits += 3;
        carry = byte >> (8 - carry_bits);
        if carry_bits >= 5 {
            out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
            carry_bits -= 5;
            carry >>= 5;
        }
    }
    if carry_bits > 0 {
        out.push(C32_ALPHABET[carry as usize]);
    }

    while out.last() == Some(&b'0') {
        out.pop();
    }
    for _ in input.iter().take_while(|&&b| b == 0) {
        out.push(b'0');
    }

    out.reverse();
    out.into_iter().map(char::from).collect()
}

fn c32_decode(input: &str) -> Result<Vec<u8>, AddressError> {
    let digits = input
        .bytes()
        .rev()
        .map(c32_digit)
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(input.len() * 5 / 8 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits: u16 = 0;
    for &digit in &digits {
        carry += (digit as u16) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            out.push((carry & 0xff) as u8);
            carry_bits -= 8;
            carry >>= 8;
        }
    }
    if carry_bits > 0 {
        out.push(carry as u8);
    }

    while out.last() == Some(&0) {
        out.pop();
    }
    for _ in digits.iter().rev().take_while(|&&d| d == 0) {
        out.push(0);
    }

    out.reverse();
    Ok(out)
}
