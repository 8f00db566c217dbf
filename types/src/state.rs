//! Lifecycle state of a gift card.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The state of a gift card token.
///
/// `Active → Active` on partial redemption, `Active → Empty` on exact exhaustion,
/// `Active → Expired` once the expiration passes. `Empty` and `Expired` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Holds value and can be redeemed.
    Active,
    /// Balance fully redeemed.
    Empty,
    /// Past its expiration; remaining value is no longer spendable.
    Expired,
}

impl CardStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Empty | Self::Expired)
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Empty => "empty",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}
