//! Parse errors for the fundamental types.

use thiserror::Error;

/// Why a string could not be read as [`crate::Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,

    #[error("amount must not be negative: {0}")]
    Negative(String),

    #[error("amount has more than two decimal places: {0}")]
    TooManyDecimals(String),

    #[error("amount is not a decimal number: {0}")]
    Invalid(String),

    #[error("amount is too large: {0}")]
    Overflow(String),
}

/// Why a string could not be read as [`crate::AccountAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("address must have 40 hex digits, got {0}")]
    WrongLength(usize),

    #[error("address contains non-hex characters: {0}")]
    NotHex(String),
}
