//! Redemption history records.

use giftcard_types::{Money, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// One committed redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRecord {
    pub token_id: TokenId,
    pub deducted: Money,
    /// Holder's remaining value after the redemption.
    pub remaining_balance: Money,
    /// Set when the remainder was moved to a new token.
    pub change_token_id: Option<TokenId>,
    /// Transaction that committed the deduction on chain.
    pub tx_hash: String,
    pub at: Timestamp,
}
