//! Fixed-point currency amounts.
//!
//! Amounts are represented as integer minor units (u128) to avoid floating-point errors.
//! One major unit is `MINOR_UNITS_PER_MAJOR` minor units, so `Money::from_minor(15_000)`
//! is `150.00`.

use crate::error::AmountParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of fractional digits carried by [`Money`].
pub const CURRENCY_DECIMALS: u32 = 2;

/// Minor units in one major unit (`10^CURRENCY_DECIMALS`).
pub const MINOR_UNITS_PER_MAJOR: u128 = 100;

/// A non-negative currency amount in minor units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u128);

impl Money {
    pub const ZERO: Self = Self(0);

    pub fn from_minor(minor: u128) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl FromStr for Money {
    type Err = AmountParseError;

    /// Parse a decimal string such as `"150"`, `"150.5"` or `"150.00"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if s.starts_with('-') {
            return Err(AmountParseError::Negative(s.to_string()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if s.ends_with('.') {
            return Err(AmountParseError::Invalid(s.to_string()));
        }
        if frac.len() > CURRENCY_DECIMALS as usize {
            return Err(AmountParseError::TooManyDecimals(s.to_string()));
        }

        let whole: u128 = whole
            .parse()
            .map_err(|_| AmountParseError::Overflow(s.to_string()))?;
        let mut frac_minor: u128 = 0;
        for (i, digit) in frac.bytes().enumerate() {
            let scale = 10u128.pow(CURRENCY_DECIMALS - 1 - i as u32);
            frac_minor += u128::from(digit - b'0') * scale;
        }

        whole
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .map(Self)
            .ok_or_else(|| AmountParseError::Overflow(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / MINOR_UNITS_PER_MAJOR,
            self.0 % MINOR_UNITS_PER_MAJOR,
            width = CURRENCY_DECIMALS as usize
        )
    }
}
