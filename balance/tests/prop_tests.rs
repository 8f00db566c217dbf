use proptest::prelude::*;

use giftcard_balance::{
    recharge, redeem, redeem_with_policy, CardFlags, ChangePolicy, GiftCardBalance,
    RedemptionError,
};
use giftcard_types::{CardStatus, Money, Timestamp, TokenId};

fn card(balance: u128) -> GiftCardBalance {
    GiftCardBalance::mint(
        TokenId::new(1),
        Money::from_minor(balance),
        Timestamp::NEVER,
        CardFlags { redeemable: true, rechargeable: true },
    )
    .unwrap()
}

proptest! {
    /// Any amount within the balance succeeds with an exact remainder.
    #[test]
    fn redeem_within_balance_is_exact(balance in 1u128..1_000_000_000, frac in 1u128..=1000) {
        let amount = (balance * frac / 1000).max(1);
        let result = redeem(&card(balance), Money::from_minor(amount), Timestamp::EPOCH).unwrap();
        prop_assert_eq!(result.deducted, Money::from_minor(amount));
        prop_assert_eq!(result.remaining_balance, Money::from_minor(balance - amount));
        prop_assert_eq!(result.status == CardStatus::Empty, amount == balance);
    }

    /// Any amount above the balance fails with InsufficientBalance.
    #[test]
    fn redeem_above_balance_fails(balance in 1u128..1_000_000_000, excess in 1u128..1_000_000) {
        let c = card(balance);
        let err = redeem(&c, Money::from_minor(balance + excess), Timestamp::EPOCH).unwrap_err();
        prop_assert_eq!(
            err,
            RedemptionError::InsufficientBalance {
                requested: Money::from_minor(balance + excess),
                available: Money::from_minor(balance),
            }
        );
        prop_assert_eq!(c.current_balance, Money::from_minor(balance));
    }

    /// A sequence of redemptions never breaks 0 <= current <= total.
    #[test]
    fn sequential_redemptions_hold_invariant(
        balance in 1u128..100_000,
        amounts in prop::collection::vec(1u128..5_000, 1..50),
    ) {
        let mut c = card(balance);
        let mut spent = 0u128;
        for amount in amounts {
            match redeem(&c, Money::from_minor(amount), Timestamp::EPOCH) {
                Ok(result) => {
                    spent += amount;
                    c = result.card;
                }
                Err(RedemptionError::InsufficientBalance { .. }) => {}
                Err(RedemptionError::CardAlreadyEmpty(_)) => break,
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            prop_assert!(c.current_balance <= c.total_value);
        }
        prop_assert_eq!(c.current_balance, Money::from_minor(balance - spent));
    }

    /// Both change policies leave the holder with the same total value.
    #[test]
    fn change_policies_conserve_value(balance in 1u128..1_000_000_000, amount in 1u128..1_000_000_000) {
        prop_assume!(amount <= balance);
        let c = card(balance);
        let same = redeem_with_policy(&c, Money::from_minor(amount), Timestamp::EPOCH, ChangePolicy::SameToken).unwrap();
        let split = redeem_with_policy(
            &c,
            Money::from_minor(amount),
            Timestamp::EPOCH,
            ChangePolicy::NewToken { change_token_id: TokenId::new(2) },
        )
        .unwrap();

        let split_held = split.card.current_balance
            + split.change_issued.map(|ch| ch.current_balance).unwrap_or(Money::ZERO);
        prop_assert_eq!(same.card.current_balance, split_held);
        prop_assert_eq!(same.remaining_balance, split.remaining_balance);
    }

    /// Recharge never leaves the balance above the face value.
    #[test]
    fn recharge_keeps_balance_within_face_value(balance in 1u128..1_000_000, top_up in 1u128..1_000_000) {
        let topped = recharge(&card(balance), Money::from_minor(top_up), Timestamp::EPOCH).unwrap();
        prop_assert_eq!(topped.current_balance, Money::from_minor(balance + top_up));
        prop_assert!(topped.current_balance <= topped.total_value);
    }
}
