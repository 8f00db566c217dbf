//! Minimal Solidity ABI encoding for static arguments.
//!
//! Only what the gift card contract needs: `uint*`, `address` and `bool` arguments and
//! return values, each occupying one 32-byte word.

use crate::error::ContractError;
use giftcard_types::AccountAddress;
use sha3::{Digest, Keccak256};

pub const WORD: usize = 32;

pub type Word = [u8; WORD];

/// A static ABI value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Address(AccountAddress),
    Bool(bool),
}

impl Token {
    fn encode(&self) -> Word {
        match self {
            Self::Uint(v) => encode_uint(*v),
            Self::Address(addr) => {
                let mut word = [0u8; WORD];
                word[12..].copy_from_slice(&addr.to_bytes());
                word
            }
            Self::Bool(b) => encode_uint(u128::from(*b)),
        }
    }
}

/// First four bytes of the Keccak-256 hash of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// `0x`-prefixed calldata for `signature` called with `args`.
pub fn encode_call(signature: &str, args: &[Token]) -> String {
    let mut data = Vec::with_capacity(4 + WORD * args.len());
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(&arg.encode());
    }
    format!("0x{}", hex::encode(data))
}

pub fn encode_uint(value: u128) -> Word {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Split `0x`-prefixed return data into words.
pub fn decode_words(data: &str) -> Result<Vec<Word>, ContractError> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(digits).map_err(|e| ContractError::Decode(format!("bad hex: {e}")))?;
    if bytes.len() % WORD != 0 {
        return Err(ContractError::Decode(format!(
            "return data length {} is not a multiple of {WORD}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(WORD)
        .map(|chunk| {
            let mut word = [0u8; WORD];
            word.copy_from_slice(chunk);
            word
        })
        .collect())
}

/// Read a word as an unsigned integer that must fit in 128 bits.
pub fn decode_uint(word: &Word) -> Result<u128, ContractError> {
    if word[..16].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode("uint256 value exceeds 128 bits".into()));
    }
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}

pub fn decode_u64(word: &Word) -> Result<u64, ContractError> {
    u64::try_from(decode_uint(word)?).map_err(|_| ContractError::Decode("value exceeds 64 bits".into()))
}

/// Read a word as a left-padded 20-byte address.
pub fn decode_address(word: &Word) -> Result<AccountAddress, ContractError> {
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ContractError::Decode("address word has non-zero padding".into()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(AccountAddress::from_bytes(bytes))
}

pub fn decode_bool(word: &Word) -> Result<bool, ContractError> {
    match decode_uint(word)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ContractError::Decode(format!("invalid bool word {other}"))),
    }
}
