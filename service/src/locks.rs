//! Per-card async locks.

use giftcard_types::TokenId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are pruned once the table grows past this many cards.
const PRUNE_THRESHOLD: usize = 1_024;

/// One async mutex per token, so operations on the same card run one at a time
/// while different cards proceed in parallel.
#[derive(Default)]
pub struct TokenLocks {
    locks: Mutex<HashMap<TokenId, Arc<AsyncMutex<()>>>>,
}

impl TokenLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `token_id`. Released when the guard drops.
    pub async fn lock(&self, token_id: TokenId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() >= PRUNE_THRESHOLD {
                locks.retain(|_, l| Arc::strong_count(l) > 1);
            }
            Arc::clone(locks.entry(token_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tokens with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
