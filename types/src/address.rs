//! Ethereum account address type with `0x` prefix.

use crate::error::AddressParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte Ethereum account address, stored lower-cased with its `0x` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The standard prefix for all account addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of hex digits after the prefix.
    pub const HEX_LEN: usize = 40;

    /// Parse and normalise an address. Checksummed (mixed-case) input is accepted
    /// but the checksum is not verified.
    pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
        let raw = raw.trim();
        let digits = raw
            .strip_prefix(Self::PREFIX)
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(raw.to_string()))?;
        if digits.len() != Self::HEX_LEN {
            return Err(AddressParseError::WrongLength(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressParseError::NotHex(raw.to_string()));
        }
        Ok(Self(format!("{}{}", Self::PREFIX, digits.to_ascii_lowercase())))
    }

    /// Build an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        let digits: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self(format!("{}{}", Self::PREFIX, digits))
    }

    /// The 20 raw address bytes.
    pub fn to_bytes(&self) -> [u8; 20] {
        let digits = &self.0.as_bytes()[Self::PREFIX.len()..];
        let mut out = [0u8; 20];
        for (i, pair) in digits.chunks(2).enumerate() {
            out[i] = (nibble(pair[0]) << 4) | nibble(pair[1]);
        }
        out
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => 0,
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = AddressParseError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccountAddress> for String {
    fn from(address: AccountAddress) -> Self {
        address.0
    }
}
