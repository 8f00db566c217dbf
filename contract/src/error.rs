use giftcard_types::TokenId;
use giftcard_wallet::{RpcError, WalletError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("gift card {0} does not exist")]
    TokenNotFound(TokenId),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("cannot decode contract data: {0}")]
    Decode(String),
}
