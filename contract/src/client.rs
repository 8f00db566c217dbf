//! The contract client seam.

use crate::error::ContractError;
use async_trait::async_trait;
use giftcard_balance::GiftCardBalance;
use giftcard_types::{AccountAddress, Money, Timestamp, TokenId};
use serde::{Deserialize, Serialize};

/// Whether a submitted transaction has landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Success,
    /// Submitted, but no receipt was seen within the polling window.
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub status: ReceiptStatus,
}

impl TransactionReceipt {
    /// Whether the transaction was mined and succeeded.
    pub fn is_confirmed(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Typed access to the deployed gift card contract.
///
/// Reads never change chain state. Writes are not retried: redemption is not
/// idempotent, so a failed write is reported and left to the caller.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Read a card's full record. `now` decides whether it is reported as expired.
    async fn get_card(&self, token_id: TokenId, now: Timestamp) -> Result<GiftCardBalance, ContractError>;

    /// Current holder of the token (ERC-721 `ownerOf`).
    async fn owner_of(&self, token_id: TokenId) -> Result<AccountAddress, ContractError>;

    /// Lowest token id the contract has not minted yet.
    async fn next_token_id(&self) -> Result<TokenId, ContractError>;

    /// Read only a card's current balance.
    async fn get_balance(&self, token_id: TokenId) -> Result<Money, ContractError>;

    /// Deduct `amount` from the card on chain.
    async fn commit_redemption(
        &self,
        token_id: TokenId,
        amount: Money,
    ) -> Result<TransactionReceipt, ContractError>;

    /// Mint `card` to `owner`.
    async fn mint(
        &self,
        owner: &AccountAddress,
        card: &GiftCardBalance,
    ) -> Result<TransactionReceipt, ContractError>;

    /// Add `amount` to a rechargeable card.
    async fn recharge(&self, token_id: TokenId, amount: Money) -> Result<TransactionReceipt, ContractError>;

    /// Human-readable name of this client.
    fn name(&self) -> &str;
}
