//! Gift card redemption service.
//!
//! Wires the pure balance calculator to a card store, a contract client and a wallet
//! connector. Callers pass an explicit [`Session`](giftcard_wallet::Session) to every
//! operation. Writes to one card are serialised by a per-token lock and guarded by the
//! store's optimistic version check.

pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod service;

pub use config::{ChangePolicyKind, ServiceConfig};
pub use error::ServiceError;
pub use locks::TokenLocks;
pub use logging::{init_logging, LogFormat};
pub use service::{CardWrite, ChangeReceipts, RedemptionOutcome, RedemptionService};
