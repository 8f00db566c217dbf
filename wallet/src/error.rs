use thiserror::Error;

/// Failures talking to a JSON-RPC provider.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider returned HTTP {0}")]
    Http(u16),

    #[error("provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("invalid response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("provider exposes no accounts")]
    NoAccounts,

    #[error("user rejected the connection request")]
    Rejected,

    #[error("invalid account from provider: {0}")]
    InvalidAccount(String),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
}
