//! Gift card balance representation.

use crate::error::RedemptionError;
use giftcard_types::{CardStatus, Money, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// Redeem/recharge permissions fixed at mint time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFlags {
    pub redeemable: bool,
    pub rechargeable: bool,
}

impl Default for CardFlags {
    fn default() -> Self {
        Self {
            redeemable: true,
            rechargeable: false,
        }
    }
}

/// The stored value of one gift card token.
///
/// Invariant: `current_balance <= total_value`. Once `status` is terminal no further
/// deduction is possible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardBalance {
    pub token_id: TokenId,

    /// Face value. Only raised by a recharge that would otherwise exceed it.
    pub total_value: Money,

    /// Value left to spend.
    pub current_balance: Money,

    /// Whether the issuer allows deductions at all.
    pub is_redeemable: bool,

    pub is_rechargeable: bool,

    /// When the card stops being spendable. [`Timestamp::NEVER`] for no expiry.
    pub expiration: Timestamp,

    pub status: CardStatus,
}

impl GiftCardBalance {
    /// Create a freshly minted card holding its full face value.
    pub fn mint(
        token_id: TokenId,
        value: Money,
        expiration: Timestamp,
        flags: CardFlags,
    ) -> Result<Self, RedemptionError> {
        if value.is_zero() {
            return Err(RedemptionError::InvalidAmount(
                "mint value must be greater than zero".into(),
            ));
        }
        Ok(Self {
            token_id,
            total_value: value,
            current_balance: value,
            is_redeemable: flags.redeemable,
            is_rechargeable: flags.rechargeable,
            expiration,
            status: CardStatus::Active,
        })
    }

    /// Rebuild a card from externally stored fields, deriving its status.
    ///
    /// Returns `None` when the fields break the balance invariant.
    pub fn from_parts(
        token_id: TokenId,
        total_value: Money,
        current_balance: Money,
        flags: CardFlags,
        expiration: Timestamp,
        now: Timestamp,
    ) -> Option<Self> {
        if current_balance > total_value {
            return None;
        }
        let status = if current_balance.is_zero() {
            CardStatus::Empty
        } else if expiration.has_passed(now) {
            CardStatus::Expired
        } else {
            CardStatus::Active
        };
        Some(Self {
            token_id,
            total_value,
            current_balance,
            is_redeemable: flags.redeemable,
            is_rechargeable: flags.rechargeable,
            expiration,
            status,
        })
    }

    pub fn flags(&self) -> CardFlags {
        CardFlags {
            redeemable: self.is_redeemable,
            rechargeable: self.is_rechargeable,
        }
    }

    /// Whether the card has expired at `now`, either by status or by the clock.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.status == CardStatus::Expired || self.expiration.has_passed(now)
    }

    /// Whether the card is empty, either by status or by balance.
    pub fn is_empty(&self) -> bool {
        self.status == CardStatus::Empty || self.current_balance.is_zero()
    }

    /// Value already spent from the face value.
    pub fn spent(&self) -> Money {
        self.total_value.saturating_sub(self.current_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn mint_holds_full_face_value() {
        let card = GiftCardBalance::mint(
            TokenId::new(1),
            money("150.00"),
            Timestamp::NEVER,
            CardFlags::default(),
        )
        .unwrap();
        assert_eq!(card.current_balance, card.total_value);
        assert_eq!(card.status, CardStatus::Active);
        assert!(card.is_redeemable);
        assert!(!card.is_rechargeable);
        assert_eq!(card.spent(), Money::ZERO);
    }

    #[test]
    fn mint_rejects_zero_value() {
        let result =
            GiftCardBalance::mint(TokenId::new(1), Money::ZERO, Timestamp::NEVER, CardFlags::default());
        assert!(matches!(result, Err(RedemptionError::InvalidAmount(_))));
    }

    #[test]
    fn from_parts_derives_status() {
        let flags = CardFlags::default();
        let now = Timestamp::new(500);

        let active = GiftCardBalance::from_parts(
            TokenId::new(1), money("10"), money("4"), flags, Timestamp::new(1_000), now,
        )
        .unwrap();
        assert_eq!(active.status, CardStatus::Active);

        let empty = GiftCardBalance::from_parts(
            TokenId::new(2), money("10"), Money::ZERO, flags, Timestamp::new(100), now,
        )
        .unwrap();
        assert_eq!(empty.status, CardStatus::Empty);

        let expired = GiftCardBalance::from_parts(
            TokenId::new(3), money("10"), money("4"), flags, Timestamp::new(100), now,
        )
        .unwrap();
        assert_eq!(expired.status, CardStatus::Expired);
    }

    #[test]
    fn from_parts_rejects_balance_above_face_value() {
        let card = GiftCardBalance::from_parts(
            TokenId::new(1),
            money("10"),
            money("11"),
            CardFlags::default(),
            Timestamp::NEVER,
            Timestamp::EPOCH,
        );
        assert!(card.is_none());
    }
}
