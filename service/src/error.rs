use giftcard_balance::RedemptionError;
use giftcard_contract::ContractError;
use giftcard_store::StoreError;
use giftcard_types::{AccountAddress, ChainId, TokenId};
use giftcard_wallet::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("redemption rejected: {0}")]
    Redemption(#[from] RedemptionError),

    #[error("contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("{account} is not allowed to {action}")]
    Unauthorized { account: AccountAddress, action: String },

    #[error("session no longer matches the connected wallet")]
    StaleSession,

    #[error("session is on chain {actual}, service expects chain {expected}")]
    WrongChain { expected: ChainId, actual: ChainId },

    /// A write was submitted but not mined within the polling window. The store holds
    /// the conservative balance; sync the card once the transaction settles.
    #[error("transaction {tx_hash} for card {token_id} is not confirmed yet")]
    Unconfirmed { token_id: TokenId, tx_hash: String },

    /// The redemption was committed but the change card could not be minted. The
    /// remainder stays on the redeemed card.
    #[error("change card {change_token_id} for {token_id} was not minted, remainder kept on {token_id}: {source}")]
    ChangeNotIssued {
        token_id: TokenId,
        change_token_id: TokenId,
        #[source]
        source: ContractError,
    },

    /// The change card was minted but the redeemed card still holds the remainder.
    /// Redeeming the remaining balance finishes the split.
    #[error("change card {change_token_id} was minted but {token_id} was not drained: {source}")]
    DrainIncomplete {
        token_id: TokenId,
        change_token_id: TokenId,
        #[source]
        source: ContractError,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
