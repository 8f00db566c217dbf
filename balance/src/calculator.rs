//! Redemption, recharge and expiry rules.

use crate::card::GiftCardBalance;
use crate::error::RedemptionError;
use giftcard_types::{CardStatus, Money, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// What happens to the remainder of a partial redemption.
///
/// The two policies are mutually exclusive; the caller picks one per redemption.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangePolicy {
    /// The remainder stays on the redeemed token.
    #[default]
    SameToken,
    /// The redeemed token is drained and the remainder moves to a new token with
    /// `change_token_id`. The caller allocates the id and mints the token.
    NewToken { change_token_id: TokenId },
}

/// A request to take `amount` off card `token_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub token_id: TokenId,
    pub amount: Money,
}

/// Outcome of a successful redemption. Nothing has been persisted yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionResult {
    pub token_id: TokenId,

    /// Always equal to the requested amount.
    pub deducted: Money,

    /// Value the holder still has after the deduction, whichever token carries it.
    pub remaining_balance: Money,

    /// Status of the redeemed token after the deduction.
    pub status: CardStatus,

    /// Updated copy of the redeemed card.
    pub card: GiftCardBalance,

    /// New token carrying the remainder, under [`ChangePolicy::NewToken`].
    pub change_issued: Option<GiftCardBalance>,
}

/// Redeem `amount` from `card`, keeping any remainder on the same token.
pub fn redeem(
    card: &GiftCardBalance,
    amount: Money,
    now: Timestamp,
) -> Result<RedemptionResult, RedemptionError> {
    redeem_with_policy(card, amount, now, ChangePolicy::SameToken)
}

/// Redeem `amount` from `card` under an explicit change policy.
///
/// Checks run in a fixed order: an empty card fails with `CardAlreadyEmpty` whatever
/// the amount, then expiry and the redeemable flag, then the amount itself.
pub fn redeem_with_policy(
    card: &GiftCardBalance,
    amount: Money,
    now: Timestamp,
    policy: ChangePolicy,
) -> Result<RedemptionResult, RedemptionError> {
    ensure_spendable(card, now)?;

    if amount.is_zero() {
        return Err(RedemptionError::InvalidAmount(
            "redemption amount must be greater than zero".into(),
        ));
    }
    let remaining = card
        .current_balance
        .checked_sub(amount)
        .ok_or(RedemptionError::InsufficientBalance {
            requested: amount,
            available: card.current_balance,
        })?;

    let mut updated = card.clone();
    let change_issued = match policy {
        ChangePolicy::SameToken => {
            updated.current_balance = remaining;
            None
        }
        ChangePolicy::NewToken { change_token_id } => {
            updated.current_balance = Money::ZERO;
            (!remaining.is_zero()).then(|| GiftCardBalance {
                token_id: change_token_id,
                total_value: remaining,
                current_balance: remaining,
                is_redeemable: card.is_redeemable,
                is_rechargeable: card.is_rechargeable,
                expiration: card.expiration,
                status: CardStatus::Active,
            })
        }
    };
    if updated.current_balance.is_zero() {
        updated.status = CardStatus::Empty;
    }

    Ok(RedemptionResult {
        token_id: card.token_id,
        deducted: amount,
        remaining_balance: remaining,
        status: updated.status,
        card: updated,
        change_issued,
    })
}

/// Redeem a [`RedemptionRequest`], rejecting requests addressed to another token.
pub fn apply(
    card: &GiftCardBalance,
    request: &RedemptionRequest,
    now: Timestamp,
    policy: ChangePolicy,
) -> Result<RedemptionResult, RedemptionError> {
    if request.token_id != card.token_id {
        return Err(RedemptionError::TokenMismatch {
            requested: request.token_id,
            card: card.token_id,
        });
    }
    redeem_with_policy(card, request.amount, now, policy)
}

/// Add `amount` to a rechargeable card.
///
/// When the new balance exceeds the face value, the face value is raised to match so
/// that `current_balance <= total_value` keeps holding.
pub fn recharge(
    card: &GiftCardBalance,
    amount: Money,
    now: Timestamp,
) -> Result<GiftCardBalance, RedemptionError> {
    if !card.is_rechargeable {
        return Err(RedemptionError::NotRechargeable(card.token_id));
    }
    if card.status == CardStatus::Empty {
        return Err(RedemptionError::CardAlreadyEmpty(card.token_id));
    }
    if card.is_expired(now) {
        return Err(not_redeemable(card, "card has expired"));
    }
    if amount.is_zero() {
        return Err(RedemptionError::InvalidAmount(
            "recharge amount must be greater than zero".into(),
        ));
    }

    let balance = card
        .current_balance
        .checked_add(amount)
        .ok_or_else(|| RedemptionError::InvalidAmount("recharge overflows the balance".into()))?;
    let mut updated = card.clone();
    updated.current_balance = balance;
    updated.total_value = updated.total_value.max(balance);
    Ok(updated)
}

/// Move an active card to `Expired` once its expiration has passed.
///
/// Returns whether the card transitioned.
pub fn check_expiry(card: &mut GiftCardBalance, now: Timestamp) -> bool {
    if !card.status.is_terminal() && card.expiration.has_passed(now) {
        card.status = CardStatus::Expired;
        return true;
    }
    false
}

fn ensure_spendable(card: &GiftCardBalance, now: Timestamp) -> Result<(), RedemptionError> {
    if card.is_empty() {
        return Err(RedemptionError::CardAlreadyEmpty(card.token_id));
    }
    if card.is_expired(now) {
        return Err(not_redeemable(card, "card has expired"));
    }
    if !card.is_redeemable {
        return Err(not_redeemable(card, "card is not redeemable"));
    }
    Ok(())
}

fn not_redeemable(card: &GiftCardBalance, reason: &str) -> RedemptionError {
    RedemptionError::CardNotRedeemable {
        token_id: card.token_id,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardFlags;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn card_with(balance: &str) -> GiftCardBalance {
        GiftCardBalance::mint(TokenId::new(7), money(balance), Timestamp::new(10_000), CardFlags::default())
            .unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::new(5_000)
    }

    #[test]
    fn partial_redemption_keeps_card_active() {
        let card = card_with("150.00");
        let result = redeem(&card, money("50.00"), now()).unwrap();

        assert_eq!(result.deducted, money("50.00"));
        assert_eq!(result.remaining_balance, money("100.00"));
        assert_eq!(result.status, CardStatus::Active);
        assert_eq!(result.card.current_balance, money("100.00"));
        assert_eq!(result.card.total_value, money("150.00"));
        assert!(result.change_issued.is_none());
    }

    #[test]
    fn exact_redemption_empties_card() {
        let card = card_with("150.00");
        let result = redeem(&card, money("150.00"), now()).unwrap();

        assert_eq!(result.remaining_balance, Money::ZERO);
        assert_eq!(result.status, CardStatus::Empty);
        assert_eq!(result.card.status, CardStatus::Empty);
    }

    #[test]
    fn over_redemption_fails_and_leaves_input_untouched() {
        let card = card_with("50.00");
        let err = redeem(&card, money("75.00"), now()).unwrap_err();

        assert_eq!(
            err,
            RedemptionError::InsufficientBalance {
                requested: money("75.00"),
                available: money("50.00"),
            }
        );
        assert_eq!(card.current_balance, money("50.00"));
    }

    #[test]
    fn zero_amount_is_invalid() {
        let card = card_with("50.00");
        assert!(matches!(
            redeem(&card, Money::ZERO, now()),
            Err(RedemptionError::InvalidAmount(_))
        ));
    }

    #[test]
    fn empty_card_rejects_any_amount() {
        let card = card_with("20.00");
        let emptied = redeem(&card, money("20.00"), now()).unwrap().card;

        for amount in [Money::ZERO, money("0.01"), money("20.00"), money("1000")] {
            assert_eq!(
                redeem(&emptied, amount, now()),
                Err(RedemptionError::CardAlreadyEmpty(TokenId::new(7)))
            );
        }
    }

    #[test]
    fn expired_card_is_not_redeemable() {
        let card = card_with("20.00");
        let err = redeem(&card, money("1.00"), Timestamp::new(10_000)).unwrap_err();
        assert!(matches!(err, RedemptionError::CardNotRedeemable { .. }));
    }

    #[test]
    fn card_flagged_non_redeemable_is_rejected() {
        let mut card = card_with("20.00");
        card.is_redeemable = false;
        let err = redeem(&card, money("1.00"), now()).unwrap_err();
        assert!(matches!(err, RedemptionError::CardNotRedeemable { .. }));
    }

    #[test]
    fn thousand_cent_redemptions_drain_ten_exactly() {
        let mut card = card_with("10.00");
        let cent = money("0.01");

        for i in 0..1000 {
            let result = redeem(&card, cent, now()).unwrap();
            assert_eq!(result.remaining_balance, Money::from_minor(999 - i));
            card = result.card;
        }

        assert_eq!(card.current_balance, Money::ZERO);
        assert_eq!(card.status, CardStatus::Empty);
        assert_eq!(
            redeem(&card, cent, now()),
            Err(RedemptionError::CardAlreadyEmpty(TokenId::new(7)))
        );
    }

    #[test]
    fn repeated_calls_with_same_input_agree() {
        let card = card_with("150.00");
        let first = redeem(&card, money("50.00"), now()).unwrap();
        let second = redeem(&card, money("50.00"), now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(card.current_balance, money("150.00"));
    }

    #[test]
    fn new_token_policy_moves_remainder_to_change_card() {
        let card = card_with("150.00");
        let policy = ChangePolicy::NewToken {
            change_token_id: TokenId::new(8),
        };
        let result = redeem_with_policy(&card, money("50.00"), now(), policy).unwrap();

        assert_eq!(result.remaining_balance, money("100.00"));
        assert_eq!(result.card.current_balance, Money::ZERO);
        assert_eq!(result.status, CardStatus::Empty);

        let change = result.change_issued.expect("change card");
        assert_eq!(change.token_id, TokenId::new(8));
        assert_eq!(change.total_value, money("100.00"));
        assert_eq!(change.current_balance, money("100.00"));
        assert_eq!(change.expiration, card.expiration);
        assert_eq!(change.status, CardStatus::Active);
    }

    #[test]
    fn new_token_policy_issues_no_change_on_exact_amount() {
        let card = card_with("150.00");
        let policy = ChangePolicy::NewToken {
            change_token_id: TokenId::new(8),
        };
        let result = redeem_with_policy(&card, money("150.00"), now(), policy).unwrap();
        assert!(result.change_issued.is_none());
        assert_eq!(result.status, CardStatus::Empty);
    }

    #[test]
    fn apply_rejects_mismatched_token() {
        let card = card_with("10.00");
        let request = RedemptionRequest {
            token_id: TokenId::new(99),
            amount: money("1.00"),
        };
        assert_eq!(
            apply(&card, &request, now(), ChangePolicy::SameToken),
            Err(RedemptionError::TokenMismatch {
                requested: TokenId::new(99),
                card: TokenId::new(7),
            })
        );
    }

    #[test]
    fn recharge_tops_up_and_raises_face_value_when_needed() {
        let mut card = card_with("100.00");
        card.is_rechargeable = true;
        let spent = redeem(&card, money("60.00"), now()).unwrap().card;

        let topped = recharge(&spent, money("30.00"), now()).unwrap();
        assert_eq!(topped.current_balance, money("70.00"));
        assert_eq!(topped.total_value, money("100.00"));

        let over = recharge(&topped, money("50.00"), now()).unwrap();
        assert_eq!(over.current_balance, money("120.00"));
        assert_eq!(over.total_value, money("120.00"));
    }

    #[test]
    fn recharge_requires_rechargeable_live_card() {
        let card = card_with("100.00");
        assert_eq!(
            recharge(&card, money("1.00"), now()),
            Err(RedemptionError::NotRechargeable(TokenId::new(7)))
        );

        let mut rechargeable = card.clone();
        rechargeable.is_rechargeable = true;
        assert!(matches!(
            recharge(&rechargeable, money("1.00"), Timestamp::new(20_000)),
            Err(RedemptionError::CardNotRedeemable { .. })
        ));
        assert!(matches!(
            recharge(&rechargeable, Money::ZERO, now()),
            Err(RedemptionError::InvalidAmount(_))
        ));

        let emptied = redeem(&rechargeable, money("100.00"), now()).unwrap().card;
        assert_eq!(
            recharge(&emptied, money("1.00"), now()),
            Err(RedemptionError::CardAlreadyEmpty(TokenId::new(7)))
        );
    }

    #[test]
    fn check_expiry_transitions_active_to_expired() {
        let mut card = card_with("10.00");
        assert!(!check_expiry(&mut card, Timestamp::new(9_999)));
        assert_eq!(card.status, CardStatus::Active);

        assert!(check_expiry(&mut card, Timestamp::new(10_000)));
        assert_eq!(card.status, CardStatus::Expired);
        assert_eq!(card.current_balance, money("10.00"));

        assert!(!check_expiry(&mut card, Timestamp::new(20_000)));
    }

    #[test]
    fn check_expiry_leaves_empty_card_alone() {
        let card = card_with("10.00");
        let mut emptied = redeem(&card, money("10.00"), now()).unwrap().card;
        assert!(!check_expiry(&mut emptied, Timestamp::new(50_000)));
        assert_eq!(emptied.status, CardStatus::Empty);
    }
}
