//! Clarity value wire format.
//!
//! Only the value types a token transfer touches are supported: integers,
//! booleans, buffers, principals, optionals and responses.

use alloy::primitives::hex;
use thiserror::Error;

use crate::stacks::address::StacksAddress;

/// Longest contract or function name the wire format allows.
pub const MAX_NAME_LEN: usize = 128;

/// Deepest nesting of optionals and responses accepted in either direction.
pub const MAX_VALUE_DEPTH: usize = 32;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_NONE: u8 = 0x09;
const TYPE_SOME: u8 = 0x0a;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClarityError {
    #[error("invalid hex: {0}")]
    Hex(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unsupported Clarity type id {0:#04x}")]
    UnsupportedType(u8),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: &'static str, actual: String },

    #[error("value nested deeper than {max} levels", max = MAX_VALUE_DEPTH)]
    TooDeep,

    #[error("buffer of {0} bytes exceeds the u32 length prefix")]
    BufferTooLong(usize),
}

/// A Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
    Int(i128),
    UInt(u128),
    Bool(bool),
    Buffer(Vec<u8>),
    StandardPrincipal(StacksAddress),
    ContractPrincipal(StacksAddress, String),
    ResponseOk(Box<ClarityValue>),
    ResponseErr(Box<ClarityValue>),
    OptionalNone,
    OptionalSome(Box<ClarityValue>),
}

impl ClarityValue {
    pub fn principal(address: StacksAddress) -> Self {
        ClarityValue::StandardPrincipal(address)
    }

    /// Serialize into consensus bytes.
    ///
    /// Fails instead of truncating when a length does not fit its prefix.
    pub fn serialize(&self) -> Result<Vec<u8>, ClarityError> {
        let mut out = Vec::new();
        self.serialize_into(&mut out)?;
        Ok(out)
    }

    pub fn serialize_into(&self, out: &mut Vec<u8>) -> Result<(), ClarityError> {
        self.write(out, 0)
    }

    fn write(&self, out: &mut Vec<u8>, depth: usize) -> Result<(), ClarityError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(ClarityError::TooDeep);
        }
        match self {
            ClarityValue::Int(v) => {
                out.push(TYPE_INT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::UInt(v) => {
                out.push(TYPE_UINT);
                out.extend_from_slice(&v.to_be_bytes());
            }
            ClarityValue::Bool(true) => out.push(TYPE_TRUE),
            ClarityValue::Bool(false) => out.push(TYPE_FALSE),
            ClarityValue::Buffer(bytes) => {
                let len = u32::try_from(bytes.len())
                    .map_err(|_| ClarityError::BufferTooLong(bytes.len()))?;
                out.push(TYPE_BUFFER);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(bytes);
            }
            ClarityValue::StandardPrincipal(address) => {
                out.push(TYPE_STANDARD_PRINCIPAL);
                write_address(out, address);
            }
            ClarityValue::ContractPrincipal(address, name) => {
                out.push(TYPE_CONTRACT_PRINCIPAL);
                write_address(out, address);
                write_name(out, name)?;
            }
            ClarityValue::ResponseOk(inner) => {
                out.push(TYPE_RESPONSE_OK);
                inner.write(out, depth + 1)?;
            }
            ClarityValue::ResponseErr(inner) => {
                out.push(TYPE_RESPONSE_ERR);
                inner.write(out, depth + 1)?;
            }
            ClarityValue::OptionalNone => out.push(TYPE_NONE),
            ClarityValue::OptionalSome(inner) => {
                out.push(TYPE_SOME);
                inner.write(out, depth + 1)?;
            }
        }
        Ok(())
    }

    /// `0x`-prefixed hex, as the node's read-only endpoint expects.
    pub fn to_hex(&self) -> Result<String, ClarityError> {
        Ok(format!("0x{}", hex::encode(self.serialize()?)))
    }

    /// Decode a single value, rejecting trailing bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, ClarityError> {
        let mut reader = Reader { bytes, pos: 0 };
        let value = reader.value(0)?;
        let remaining = bytes.len() - reader.pos;
        if remaining != 0 {
            return Err(ClarityError::TrailingBytes(remaining));
        }
        Ok(value)
    }

    /// Decode from hex, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ClarityError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ClarityError::Hex(e.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Unwrap `(ok u<n>)`, the shape SIP-010 `get-balance` returns.
    pub fn expect_ok_uint(&self) -> Result<u128, ClarityError> {
        match self {
            ClarityValue::ResponseOk(inner) => match inner.as_ref() {
                ClarityValue::UInt(v) => Ok(*v),
                other => Err(ClarityError::TypeMismatch {
                    expected: "uint",
                    actual: other.type_name().to_string(),
                }),
            },
            other => Err(ClarityError::TypeMismatch {
                expected: "(ok uint)",
                actual: other.type_name().to_string(),
            }),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ClarityValue::Int(_) => "int",
            ClarityValue::UInt(_) => "uint",
            ClarityValue::Bool(_) => "bool",
            ClarityValue::Buffer(_) => "buff",
            ClarityValue::StandardPrincipal(_) | ClarityValue::ContractPrincipal(..) => "principal",
            ClarityValue::ResponseOk(_) => "(ok ...)",
            ClarityValue::ResponseErr(_) => "(err ...)",
            ClarityValue::OptionalNone => "none",
            ClarityValue::OptionalSome(_) => "(some ...)",
        }
    }
}

fn write_address(out: &mut Vec<u8>, address: &StacksAddress) {
    out.push(address.version());
    out.extend_from_slice(address.hash160());
}

/// Check a contract or function name fits the one-byte length prefix.
pub fn check_name(name: &str) -> Result<(), ClarityError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !name.is_ascii() {
        return Err(ClarityError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Write a length-prefixed name after checking it.
pub fn write_name(out: &mut Vec<u8>, name: &str) -> Result<(), ClarityError> {
    check_name(name)?;
    out.push(name.len() as u8);
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClarityError> {
        let end = self.pos.checked_add(n).ok_or(ClarityError::UnexpectedEof)?;
        let slice = self.bytes.get(self.pos..end).ok_or(ClarityError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8, ClarityError> {
        Ok(self.take(1)?[0])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ClarityError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn address(&mut self) -> Result<StacksAddress, ClarityError> {
        let version = self.byte()?;
        if version >= 32 {
            return Err(ClarityError::TypeMismatch {
                expected: "address version below 32",
                actual: version.to_string(),
            });
        }
        Ok(StacksAddress::new(version, self.array()?))
    }

    fn value(&mut self, depth: usize) -> Result<ClarityValue, ClarityError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(ClarityError::TooDeep);
        }
        let value = match self.byte()? {
            TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.array()?)),
            TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.array()?)),
            TYPE_BUFFER => {
                let len = u32::from_be_bytes(self.array()?) as usize;
                ClarityValue::Buffer(self.take(len)?.to_vec())
            }
            TYPE_TRUE => ClarityValue::Bool(true),
            TYPE_FALSE => ClarityValue::Bool(false),
            TYPE_STANDARD_PRINCIPAL => ClarityValue::StandardPrincipal(self.address()?),
            TYPE_CONTRACT_PRINCIPAL => {
                let address = self.address()?;
                let len = self.byte()? as usize;
                let name = String::from_utf8(self.take(len)?.to_vec())
                    .map_err(|e| ClarityError::InvalidName(e.to_string()))?;
                ClarityValue::ContractPrincipal(address, name)
            }
            TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.value(depth + 1)?)),
            TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.value(depth + 1)?)),
            TYPE_NONE => ClarityValue::OptionalNone,
            TYPE_SOME => ClarityValue::OptionalSome(Box::new(self.value(depth + 1)?)),
            other => return Err(ClarityError::UnsupportedType(other)),
        };
        Ok(value)
    }
}
