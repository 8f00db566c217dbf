//! Redemption errors.

use giftcard_types::{Money, TokenId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedemptionError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Money, available: Money },

    #[error("gift card {token_id} is not redeemable: {reason}")]
    CardNotRedeemable { token_id: TokenId, reason: String },

    #[error("gift card {0} is already empty")]
    CardAlreadyEmpty(TokenId),

    #[error("gift card {0} is not rechargeable")]
    NotRechargeable(TokenId),

    #[error("request is for {requested} but card is {card}")]
    TokenMismatch { requested: TokenId, card: TokenId },
}
