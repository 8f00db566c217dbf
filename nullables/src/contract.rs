//! In-memory gift card ledger standing in for the chain.

use async_trait::async_trait;
use giftcard_balance::{check_expiry, recharge, redeem, GiftCardBalance};
use giftcard_contract::{ContractClient, ContractError, ReceiptStatus, TransactionReceipt};
use giftcard_types::{AccountAddress, Money, Timestamp, TokenId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// How an upcoming write should behave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied and mined.
    Succeed,
    /// Rejected without touching state.
    Revert,
    /// Applied, but reported with a pending receipt.
    Pend,
}

/// An in-memory contract for testing.
///
/// Writes are applied with the same rules the real contract enforces, and every write
/// gets a fresh fake transaction hash. Outcomes of upcoming writes can be scripted and
/// latency can be injected.
pub struct NullContract {
    cards: Mutex<HashMap<TokenId, GiftCardBalance>>,
    owners: Mutex<HashMap<TokenId, AccountAddress>>,
    tx_counter: AtomicU64,
    script: Mutex<VecDeque<WriteOutcome>>,
    write_latency: Mutex<Duration>,
}

impl NullContract {
    pub fn new() -> Self {
        Self {
            cards: Mutex::new(HashMap::new()),
            owners: Mutex::new(HashMap::new()),
            tx_counter: AtomicU64::new(0),
            script: Mutex::new(VecDeque::new()),
            write_latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Pre-load a card as if it had been minted to `owner`.
    pub fn with_card(self, card: GiftCardBalance, owner: AccountAddress) -> Self {
        self.owners.lock().unwrap().insert(card.token_id, owner);
        self.cards.lock().unwrap().insert(card.token_id, card);
        self
    }

    /// Queue outcomes for the next writes, in order. Unscripted writes succeed.
    pub fn script_writes(&self, outcomes: impl IntoIterator<Item = WriteOutcome>) {
        self.script.lock().unwrap().extend(outcomes);
    }

    /// Make the next write revert.
    pub fn fail_next_write(&self) {
        self.script_writes([WriteOutcome::Revert]);
    }

    /// Make the next write land without a mined receipt.
    pub fn pend_next_write(&self) {
        self.script_writes([WriteOutcome::Pend]);
    }

    /// Delay every write, to widen race windows in concurrency tests.
    pub fn set_write_latency(&self, latency: Duration) {
        *self.write_latency.lock().unwrap() = latency;
    }

    /// The card as currently recorded "on chain".
    pub fn card(&self, token_id: TokenId) -> Option<GiftCardBalance> {
        self.cards.lock().unwrap().get(&token_id).cloned()
    }

    pub fn recorded_owner(&self, token_id: TokenId) -> Option<AccountAddress> {
        self.owners.lock().unwrap().get(&token_id).cloned()
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> u64 {
        self.tx_counter.load(Ordering::SeqCst)
    }

    /// Returns whether the write should be reported as pending.
    async fn begin_write(&self) -> Result<bool, ContractError> {
        let latency = *self.write_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(WriteOutcome::Succeed);
        match outcome {
            WriteOutcome::Succeed => Ok(false),
            WriteOutcome::Pend => Ok(true),
            WriteOutcome::Revert => Err(ContractError::Reverted {
                tx_hash: "0xfailed".into(),
            }),
        }
    }

    fn receipt(&self, pending: bool) -> TransactionReceipt {
        let n = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        TransactionReceipt {
            tx_hash: format!("0x{n:064x}"),
            block_number: (!pending).then_some(n),
            status: if pending {
                ReceiptStatus::Pending
            } else {
                ReceiptStatus::Success
            },
        }
    }

    fn reverted(token_id: TokenId) -> ContractError {
        ContractError::Reverted {
            tx_hash: format!("0xreverted{}", token_id.value()),
        }
    }
}

impl Default for NullContract {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractClient for NullContract {
    async fn get_card(&self, token_id: TokenId, now: Timestamp) -> Result<GiftCardBalance, ContractError> {
        let mut card = self.card(token_id).ok_or(ContractError::TokenNotFound(token_id))?;
        check_expiry(&mut card, now);
        Ok(card)
    }

    async fn owner_of(&self, token_id: TokenId) -> Result<AccountAddress, ContractError> {
        self.recorded_owner(token_id)
            .ok_or(ContractError::TokenNotFound(token_id))
    }

    async fn next_token_id(&self) -> Result<TokenId, ContractError> {
        let cards = self.cards.lock().unwrap();
        let next = cards.keys().map(|id| id.value() + 1).max().unwrap_or(0);
        Ok(TokenId::new(next))
    }

    async fn get_balance(&self, token_id: TokenId) -> Result<Money, ContractError> {
        self.card(token_id)
            .map(|c| c.current_balance)
            .ok_or(ContractError::TokenNotFound(token_id))
    }

    async fn commit_redemption(
        &self,
        token_id: TokenId,
        amount: Money,
    ) -> Result<TransactionReceipt, ContractError> {
        let pending = self.begin_write().await?;
        let mut cards = self.cards.lock().unwrap();
        let card = cards.get_mut(&token_id).ok_or(ContractError::TokenNotFound(token_id))?;
        // The contract does not know about expiry-by-clock; it only enforces balance.
        let result = redeem(card, amount, Timestamp::EPOCH).map_err(|_| Self::reverted(token_id))?;
        *card = result.card;
        Ok(self.receipt(pending))
    }

    async fn mint(
        &self,
        owner: &AccountAddress,
        card: &GiftCardBalance,
    ) -> Result<TransactionReceipt, ContractError> {
        let pending = self.begin_write().await?;
        let mut cards = self.cards.lock().unwrap();
        if cards.contains_key(&card.token_id) {
            return Err(Self::reverted(card.token_id));
        }
        cards.insert(card.token_id, card.clone());
        self.owners.lock().unwrap().insert(card.token_id, owner.clone());
        Ok(self.receipt(pending))
    }

    async fn recharge(&self, token_id: TokenId, amount: Money) -> Result<TransactionReceipt, ContractError> {
        let pending = self.begin_write().await?;
        let mut cards = self.cards.lock().unwrap();
        let card = cards.get_mut(&token_id).ok_or(ContractError::TokenNotFound(token_id))?;
        *card = recharge(card, amount, Timestamp::EPOCH).map_err(|_| Self::reverted(token_id))?;
        Ok(self.receipt(pending))
    }

    fn name(&self) -> &str {
        "null-contract"
    }
}
