//! Card storage trait.

use crate::redemption::RedemptionRecord;
use crate::StoreError;
use giftcard_balance::GiftCardBalance;
use giftcard_types::{AccountAddress, TokenId};
use serde::{Deserialize, Serialize};

/// A card as persisted, with its owner and optimistic-concurrency version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    pub card: GiftCardBalance,
    pub owner: AccountAddress,
    /// Starts at 1 on insert and increases by one on every successful swap.
    pub version: u64,
}

/// Trait for gift card storage operations.
pub trait GiftCardStore: Send + Sync {
    fn get(&self, token_id: TokenId) -> Result<StoredCard, StoreError>;

    /// Insert a new card at version 1. Fails with `Duplicate` if the id is taken.
    fn insert(&self, card: GiftCardBalance, owner: AccountAddress) -> Result<StoredCard, StoreError>;

    /// Replace the card only if its stored version is still `expected_version`.
    ///
    /// Returns the new version.
    fn compare_and_swap(
        &self,
        token_id: TokenId,
        expected_version: u64,
        card: GiftCardBalance,
    ) -> Result<u64, StoreError>;

    /// Reserve an unused token id no lower than `floor`. Never returns the same id twice.
    ///
    /// `floor` is the lowest id the chain has not minted, so ids minted elsewhere are
    /// never handed out.
    fn next_token_id(&self, floor: TokenId) -> Result<TokenId, StoreError>;

    fn record_redemption(&self, record: RedemptionRecord) -> Result<(), StoreError>;

    /// Redemptions of `token_id`, oldest first.
    fn redemptions(&self, token_id: TokenId) -> Result<Vec<RedemptionRecord>, StoreError>;

    fn exists(&self, token_id: TokenId) -> Result<bool, StoreError> {
        match self.get(token_id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
