//! Thread-safe in-memory backend.

use crate::card::{GiftCardStore, StoredCard};
use crate::redemption::RedemptionRecord;
use crate::StoreError;
use giftcard_balance::GiftCardBalance;
use giftcard_types::{AccountAddress, TokenId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    cards: HashMap<TokenId, StoredCard>,
    redemptions: HashMap<TokenId, Vec<RedemptionRecord>>,
    /// Lowest id that has been neither inserted nor reserved.
    next_id: u64,
}

/// An in-memory card store.
///
/// All state sits behind one mutex, so a compare-and-swap is atomic with respect to
/// every other operation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.cards.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store mutex poisoned".into()))
    }
}

impl GiftCardStore for MemoryStore {
    fn get(&self, token_id: TokenId) -> Result<StoredCard, StoreError> {
        self.lock()?
            .cards
            .get(&token_id)
            .cloned()
            .ok_or(StoreError::NotFound(token_id))
    }

    fn insert(&self, card: GiftCardBalance, owner: AccountAddress) -> Result<StoredCard, StoreError> {
        if card.current_balance > card.total_value {
            return Err(StoreError::Invalid(format!(
                "card {} balance exceeds its face value",
                card.token_id
            )));
        }
        let mut inner = self.lock()?;
        let token_id = card.token_id;
        if inner.cards.contains_key(&token_id) {
            return Err(StoreError::Duplicate(token_id));
        }
        let stored = StoredCard {
            card,
            owner,
            version: 1,
        };
        inner.cards.insert(token_id, stored.clone());
        inner.next_id = inner.next_id.max(token_id.value().saturating_add(1));
        Ok(stored)
    }

    fn compare_and_swap(
        &self,
        token_id: TokenId,
        expected_version: u64,
        card: GiftCardBalance,
    ) -> Result<u64, StoreError> {
        if card.token_id != token_id {
            return Err(StoreError::Invalid(format!(
                "swap for {token_id} carries card {}",
                card.token_id
            )));
        }
        if card.current_balance > card.total_value {
            return Err(StoreError::Invalid(format!(
                "card {token_id} balance exceeds its face value"
            )));
        }
        let mut inner = self.lock()?;
        let stored = inner
            .cards
            .get_mut(&token_id)
            .ok_or(StoreError::NotFound(token_id))?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                token_id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        stored.card = card;
        stored.version += 1;
        Ok(stored.version)
    }

    fn next_token_id(&self, floor: TokenId) -> Result<TokenId, StoreError> {
        let mut inner = self.lock()?;
        let id = inner.next_id.max(floor.value());
        inner.next_id = id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
        Ok(TokenId::new(id))
    }

    fn record_redemption(&self, record: RedemptionRecord) -> Result<(), StoreError> {
        self.lock()?
            .redemptions
            .entry(record.token_id)
            .or_default()
            .push(record);
        Ok(())
    }

    fn redemptions(&self, token_id: TokenId) -> Result<Vec<RedemptionRecord>, StoreError> {
        Ok(self
            .lock()?
            .redemptions
            .get(&token_id)
            .cloned()
            .unwrap_or_default())
    }
}
