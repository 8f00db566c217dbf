use giftcard_types::TokenId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("gift card {0} not found")]
    NotFound(TokenId),

    #[error("gift card {0} already exists")]
    Duplicate(TokenId),

    #[error("version conflict on {token_id}: expected {expected}, found {actual}")]
    VersionConflict {
        token_id: TokenId,
        expected: u64,
        actual: u64,
    },

    #[error("token id space exhausted")]
    IdsExhausted,

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
