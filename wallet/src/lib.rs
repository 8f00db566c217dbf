//! Wallet connectivity for the gift card workspace.
//!
//! - [`JsonRpcTransport`]: Ethereum JSON-RPC over HTTP, shared with the contract client
//! - [`WalletConnector`]: injected capability with connect/disconnect/subscribe
//! - [`RpcWalletConnector`]: connector backed by a provider's managed accounts
//! - [`Session`]: the explicit credential every service call receives

pub mod connector;
pub mod error;
pub mod provider;
pub mod rpc;
pub mod session;

pub use connector::{ConnectionState, WalletConnector, WalletEvent};
pub use error::{RpcError, WalletError};
pub use provider::RpcWalletConnector;
pub use rpc::{parse_quantity, JsonRpcTransport};
pub use session::{Role, Session};
