//! Client for the gift card contract.
//!
//! The contract itself is deployed elsewhere; this crate only encodes calls to it.
//! [`ContractClient`] is the seam the service depends on, [`EthContractClient`] the
//! implementation that talks to an Ethereum JSON-RPC provider.

pub mod abi;
pub mod client;
pub mod error;
pub mod eth;

pub use client::{ContractClient, ReceiptStatus, TransactionReceipt};
pub use error::ContractError;
pub use eth::{EthContractClient, EthContractConfig};
