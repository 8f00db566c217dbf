//! Gift card balance/change accounting.
//!
//! Every page that takes value off a gift card goes through this crate. It is a set of
//! pure functions over [`GiftCardBalance`]: given a card and a requested amount they
//! return the updated card (and any change card) without touching storage or the chain.
//! Committing the result is the caller's job, and callers must serialise commits per
//! token id.

pub mod calculator;
pub mod card;
pub mod error;

pub use calculator::{
    apply, check_expiry, recharge, redeem, redeem_with_policy, ChangePolicy, RedemptionRequest,
    RedemptionResult,
};
pub use card::{CardFlags, GiftCardBalance};
pub use error::RedemptionError;
