//! Redemption orchestration.
//!
//! Every write follows the same sequence under the card's lock: load, compute with
//! the pure calculator, reserve the new balance in the store with compare-and-swap,
//! then commit on chain. A failed chain write restores the previous balance. A write
//! without a mined receipt is reported as unconfirmed and never recorded as final.

use giftcard_balance::{
    apply, check_expiry, recharge, CardFlags, ChangePolicy, GiftCardBalance, RedemptionRequest,
    RedemptionResult,
};
use giftcard_contract::{ContractClient, ContractError, TransactionReceipt};
use giftcard_store::{GiftCardStore, RedemptionRecord, StoreError, StoredCard};
use giftcard_types::{AccountAddress, CardStatus, ChainId, Clock, Money, Timestamp, TokenId};
use giftcard_wallet::{Role, Session, WalletConnector};
use serde::Serialize;
use std::sync::Arc;

use crate::config::{ChangePolicyKind, ServiceConfig};
use crate::locks::TokenLocks;
use crate::ServiceError;

/// Roles that may redeem any card. Holders may always redeem their own.
const REDEEM_ROLES: &[Role] = &[Role::Merchant, Role::Admin];
/// Roles that may recharge any card.
const RECHARGE_ROLES: &[Role] = &[Role::Admin];
/// Roles that may issue new cards.
const ISSUE_ROLES: &[Role] = &[Role::Merchant, Role::Admin];

/// A committed redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedemptionOutcome {
    pub result: RedemptionResult,
    /// Receipt of the on-chain deduction of the requested amount.
    pub receipt: TransactionReceipt,
    /// Receipts of the change split, under the new-token policy.
    pub change: Option<ChangeReceipts>,
    /// Store version of the redeemed card after the write.
    pub version: u64,
}

/// The two writes that move a remainder onto a change card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeReceipts {
    pub mint: TransactionReceipt,
    /// Removes the remainder from the redeemed card.
    pub drain: TransactionReceipt,
}

/// A card written to the store and the chain together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardWrite {
    pub stored: StoredCard,
    pub receipt: TransactionReceipt,
}

/// What became of a chain write.
enum ChainWrite {
    Confirmed(TransactionReceipt),
    Pending(TransactionReceipt),
    Failed(ContractError),
}

impl From<Result<TransactionReceipt, ContractError>> for ChainWrite {
    fn from(result: Result<TransactionReceipt, ContractError>) -> Self {
        match result {
            Ok(receipt) if receipt.is_confirmed() => Self::Confirmed(receipt),
            Ok(receipt) => Self::Pending(receipt),
            Err(e) => Self::Failed(e),
        }
    }
}

pub struct RedemptionService {
    contract: Arc<dyn ContractClient>,
    store: Arc<dyn GiftCardStore>,
    wallet: Arc<dyn WalletConnector>,
    clock: Arc<dyn Clock>,
    chain_id: ChainId,
    change_policy: ChangePolicyKind,
    locks: TokenLocks,
}

impl RedemptionService {
    pub fn new(
        contract: Arc<dyn ContractClient>,
        store: Arc<dyn GiftCardStore>,
        wallet: Arc<dyn WalletConnector>,
        clock: Arc<dyn Clock>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            contract,
            store,
            wallet,
            clock,
            chain_id: config.chain_id,
            change_policy: config.change_policy,
            locks: TokenLocks::new(),
        }
    }

    pub fn change_policy(&self) -> ChangePolicyKind {
        self.change_policy
    }

    /// Preview a redemption without writing anything.
    ///
    /// Under the new-token policy the change card carries the chain's next unminted id.
    /// It is not reserved, so the committed redemption may use a different one.
    pub async fn quote(
        &self,
        session: &Session,
        request: RedemptionRequest,
    ) -> Result<RedemptionResult, ServiceError> {
        self.check_session(session)?;
        let _guard = self.locks.lock(request.token_id).await;
        let stored = self.load(request.token_id).await?;
        authorize(session, &stored, REDEEM_ROLES, "redeem")?;
        let policy = self.policy_for(&stored.card, request.amount, false).await?;
        Ok(apply(&stored.card, &request, self.clock.now(), policy)?)
    }

    /// Redeem `request.amount` from a card and commit it on chain.
    ///
    /// Under the new-token policy the split takes three writes: deduct the amount,
    /// mint the change card, then drain the remainder from the redeemed card. The
    /// remainder is on chain after every step, so a failure part way never loses it.
    pub async fn redeem(
        &self,
        session: &Session,
        request: RedemptionRequest,
    ) -> Result<RedemptionOutcome, ServiceError> {
        self.check_session(session)?;
        let token_id = request.token_id;
        let _guard = self.locks.lock(token_id).await;

        let stored = self.load(token_id).await?;
        authorize(session, &stored, REDEEM_ROLES, "redeem")?;

        let now = self.clock.now();
        let policy = self.policy_for(&stored.card, request.amount, true).await?;
        let result = apply(&stored.card, &request, now, policy).inspect_err(|e| {
            tracing::info!(%token_id, amount = %request.amount, error = %e, "redemption rejected");
        })?;

        let version = self
            .store
            .compare_and_swap(token_id, stored.version, result.card.clone())?;

        // The redeemed card as the chain holds it between the deduction and the drain.
        let mut deducted = stored.card.clone();
        deducted.current_balance = result.remaining_balance;
        if deducted.current_balance.is_zero() {
            deducted.status = CardStatus::Empty;
        }

        let receipt = match ChainWrite::from(
            self.contract.commit_redemption(token_id, result.deducted).await,
        ) {
            ChainWrite::Confirmed(receipt) => receipt,
            ChainWrite::Pending(receipt) => {
                tracing::warn!(%token_id, tx_hash = %receipt.tx_hash, "redemption not confirmed");
                if result.change_issued.is_some() {
                    self.restore(token_id, version, deducted);
                }
                return Err(ServiceError::Unconfirmed {
                    token_id,
                    tx_hash: receipt.tx_hash,
                });
            }
            ChainWrite::Failed(e) => {
                tracing::warn!(%token_id, error = %e, "chain commit failed, restoring balance");
                self.restore(token_id, version, stored.card);
                return Err(e.into());
            }
        };
        tracing::info!(
            %token_id,
            deducted = %result.deducted,
            remaining = %result.remaining_balance,
            tx_hash = %receipt.tx_hash,
            "redemption committed"
        );

        let Some(change) = &result.change_issued else {
            self.record(&result, None, &receipt, now);
            return Ok(RedemptionOutcome {
                result,
                receipt,
                change: None,
                version,
            });
        };

        match self
            .split_change(token_id, change, &stored.owner, version, deducted)
            .await
        {
            Ok(receipts) => {
                self.record(&result, Some(change.token_id), &receipt, now);
                Ok(RedemptionOutcome {
                    result,
                    receipt,
                    change: Some(receipts),
                    version,
                })
            }
            Err(e) => {
                let minted = match &e {
                    ServiceError::DrainIncomplete { .. } => true,
                    ServiceError::Unconfirmed { token_id: pending, .. } => *pending == token_id,
                    _ => false,
                };
                self.record(&result, minted.then_some(change.token_id), &receipt, now);
                Err(e)
            }
        }
    }

    /// Mint a new card to `owner`.
    pub async fn mint(
        &self,
        session: &Session,
        owner: AccountAddress,
        value: Money,
        expiration: Timestamp,
        flags: CardFlags,
    ) -> Result<CardWrite, ServiceError> {
        self.check_session(session)?;
        if !session.has_any_role(ISSUE_ROLES) {
            return Err(ServiceError::Unauthorized {
                account: session.account.clone(),
                action: "issue cards".into(),
            });
        }
        let token_id = self.allocate_token_id().await?;
        let card = GiftCardBalance::mint(token_id, value, expiration, flags)?;
        let receipt = match ChainWrite::from(self.contract.mint(&owner, &card).await) {
            ChainWrite::Confirmed(receipt) => receipt,
            ChainWrite::Pending(receipt) => {
                return Err(ServiceError::Unconfirmed {
                    token_id,
                    tx_hash: receipt.tx_hash,
                })
            }
            ChainWrite::Failed(e) => return Err(e.into()),
        };
        let stored = self.store.insert(card, owner)?;
        tracing::info!(%token_id, owner = %stored.owner, %value, tx_hash = %receipt.tx_hash, "card minted");
        Ok(CardWrite { stored, receipt })
    }

    /// Add `amount` to a rechargeable card.
    pub async fn recharge(
        &self,
        session: &Session,
        token_id: TokenId,
        amount: Money,
    ) -> Result<CardWrite, ServiceError> {
        self.check_session(session)?;
        let _guard = self.locks.lock(token_id).await;

        let stored = self.load(token_id).await?;
        authorize(session, &stored, RECHARGE_ROLES, "recharge")?;

        let updated = recharge(&stored.card, amount, self.clock.now())?;
        let version = self
            .store
            .compare_and_swap(token_id, stored.version, updated.clone())?;

        // Until mined, the added value must not be spendable.
        let receipt = match ChainWrite::from(self.contract.recharge(token_id, amount).await) {
            ChainWrite::Confirmed(receipt) => receipt,
            ChainWrite::Pending(receipt) => {
                tracing::warn!(%token_id, tx_hash = %receipt.tx_hash, "recharge not confirmed");
                self.restore(token_id, version, stored.card);
                return Err(ServiceError::Unconfirmed {
                    token_id,
                    tx_hash: receipt.tx_hash,
                });
            }
            ChainWrite::Failed(e) => {
                tracing::warn!(%token_id, error = %e, "chain recharge failed, restoring balance");
                self.restore(token_id, version, stored.card);
                return Err(e.into());
            }
        };
        tracing::info!(%token_id, %amount, balance = %updated.current_balance, tx_hash = %receipt.tx_hash, "card recharged");
        Ok(CardWrite {
            stored: StoredCard {
                card: updated,
                owner: stored.owner,
                version,
            },
            receipt,
        })
    }

    /// Current state of a card, with its status brought up to date with the clock.
    pub async fn balance(&self, token_id: TokenId) -> Result<GiftCardBalance, ServiceError> {
        let _guard = self.locks.lock(token_id).await;
        let mut card = self.load(token_id).await?.card;
        check_expiry(&mut card, self.clock.now());
        Ok(card)
    }

    /// Balance as the contract reports it right now, bypassing the store.
    pub async fn chain_balance(&self, token_id: TokenId) -> Result<Money, ServiceError> {
        Ok(self.contract.get_balance(token_id).await?)
    }

    /// Replace the stored copy of a card with what the chain reports.
    pub async fn sync_card(&self, token_id: TokenId) -> Result<StoredCard, ServiceError> {
        let _guard = self.locks.lock(token_id).await;
        self.sync(token_id).await
    }

    /// Redemptions of a card, oldest first.
    pub fn history(&self, token_id: TokenId) -> Result<Vec<RedemptionRecord>, ServiceError> {
        Ok(self.store.redemptions(token_id)?)
    }

    fn check_session(&self, session: &Session) -> Result<(), ServiceError> {
        if session.chain_id != self.chain_id {
            return Err(ServiceError::WrongChain {
                expected: self.chain_id,
                actual: session.chain_id,
            });
        }
        if !session.matches(&self.wallet.state()) {
            return Err(ServiceError::StaleSession);
        }
        Ok(())
    }

    /// Reserve an id that is neither minted on chain nor handed out by this store.
    async fn allocate_token_id(&self) -> Result<TokenId, ServiceError> {
        let floor = self.contract.next_token_id().await?;
        Ok(self.store.next_token_id(floor)?)
    }

    /// Change ids are only needed when the redemption can leave a remainder, and only
    /// reserved when `reserve` is set.
    async fn policy_for(
        &self,
        card: &GiftCardBalance,
        amount: Money,
        reserve: bool,
    ) -> Result<ChangePolicy, ServiceError> {
        if self.change_policy == ChangePolicyKind::SameToken || amount >= card.current_balance {
            return Ok(ChangePolicy::SameToken);
        }
        let change_token_id = if reserve {
            self.allocate_token_id().await?
        } else {
            self.contract.next_token_id().await?
        };
        Ok(ChangePolicy::NewToken { change_token_id })
    }

    /// Caller must hold the card's lock.
    async fn load(&self, token_id: TokenId) -> Result<StoredCard, ServiceError> {
        match self.store.get(token_id) {
            Ok(stored) => Ok(stored),
            Err(StoreError::NotFound(_)) => self.sync(token_id).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Caller must hold the card's lock.
    async fn sync(&self, token_id: TokenId) -> Result<StoredCard, ServiceError> {
        let card = self.contract.get_card(token_id, self.clock.now()).await?;
        let stored = match self.store.get(token_id) {
            Ok(existing) => {
                let version = self
                    .store
                    .compare_and_swap(token_id, existing.version, card.clone())?;
                StoredCard {
                    card,
                    owner: existing.owner,
                    version,
                }
            }
            Err(StoreError::NotFound(_)) => {
                let owner = self.contract.owner_of(token_id).await?;
                self.store.insert(card, owner)?
            }
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(%token_id, balance = %stored.card.current_balance, version = stored.version, "card synced from chain");
        Ok(stored)
    }

    /// Mint `change` to `owner`, then drain its value from `token_id`.
    ///
    /// `deducted` is the redeemed card as the chain holds it before the drain. It is
    /// written back over the reserved (drained) copy at `version` if the split stops
    /// before the drain is mined.
    async fn split_change(
        &self,
        token_id: TokenId,
        change: &GiftCardBalance,
        owner: &AccountAddress,
        version: u64,
        deducted: GiftCardBalance,
    ) -> Result<ChangeReceipts, ServiceError> {
        let change_token_id = change.token_id;
        let mint = match ChainWrite::from(self.contract.mint(owner, change).await) {
            ChainWrite::Confirmed(receipt) => receipt,
            ChainWrite::Pending(receipt) => {
                tracing::warn!(%token_id, %change_token_id, tx_hash = %receipt.tx_hash, "change mint not confirmed");
                self.restore(token_id, version, deducted);
                return Err(ServiceError::Unconfirmed {
                    token_id: change_token_id,
                    tx_hash: receipt.tx_hash,
                });
            }
            ChainWrite::Failed(source) => {
                tracing::error!(%token_id, %change_token_id, error = %source, "change mint failed, remainder kept");
                self.restore(token_id, version, deducted);
                return Err(ServiceError::ChangeNotIssued {
                    token_id,
                    change_token_id,
                    source,
                });
            }
        };
        if let Err(e) = self.store.insert(change.clone(), owner.clone()) {
            tracing::error!(%change_token_id, error = %e, "failed to store change card, sync it from chain");
        }

        let drain = match ChainWrite::from(
            self.contract
                .commit_redemption(token_id, change.current_balance)
                .await,
        ) {
            ChainWrite::Confirmed(receipt) => receipt,
            ChainWrite::Pending(receipt) => {
                // Likely to land; the drained copy stays reserved.
                tracing::warn!(%token_id, tx_hash = %receipt.tx_hash, "drain not confirmed");
                return Err(ServiceError::Unconfirmed {
                    token_id,
                    tx_hash: receipt.tx_hash,
                });
            }
            ChainWrite::Failed(source) => {
                tracing::error!(%token_id, %change_token_id, error = %source, "drain failed after change mint");
                self.restore(token_id, version, deducted);
                return Err(ServiceError::DrainIncomplete {
                    token_id,
                    change_token_id,
                    source,
                });
            }
        };
        tracing::info!(
            %token_id,
            %change_token_id,
            value = %change.current_balance,
            mint_tx = %mint.tx_hash,
            drain_tx = %drain.tx_hash,
            "change card issued"
        );
        Ok(ChangeReceipts { mint, drain })
    }

    /// The deduction is already on chain, so a failed history write is logged rather
    /// than reported as a failed redemption.
    fn record(
        &self,
        result: &RedemptionResult,
        change_token_id: Option<TokenId>,
        receipt: &TransactionReceipt,
        at: Timestamp,
    ) {
        let record = RedemptionRecord {
            token_id: result.token_id,
            deducted: result.deducted,
            remaining_balance: result.remaining_balance,
            change_token_id,
            tx_hash: receipt.tx_hash.clone(),
            at,
        };
        if let Err(e) = self.store.record_redemption(record) {
            tracing::error!(token_id = %result.token_id, tx_hash = %receipt.tx_hash, error = %e, "failed to record redemption");
        }
    }

    /// Put back the balance reserved at `version`.
    fn restore(&self, token_id: TokenId, version: u64, previous: GiftCardBalance) {
        if let Err(e) = self.store.compare_and_swap(token_id, version, previous) {
            tracing::error!(%token_id, version, error = %e, "failed to restore balance after chain failure");
        }
    }
}

fn authorize(
    session: &Session,
    stored: &StoredCard,
    roles: &[Role],
    action: &str,
) -> Result<(), ServiceError> {
    if session.account == stored.owner || session.has_any_role(roles) {
        return Ok(());
    }
    Err(ServiceError::Unauthorized {
        account: session.account.clone(),
        action: format!("{action} card {}", stored.card.token_id),
    })
}
